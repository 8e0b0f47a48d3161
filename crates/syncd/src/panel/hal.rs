//! Platform access to HID panels
//!
//! This module isolates everything that touches the operating system's HID
//! stack behind two small traits:
//! - `PanelPlatform`: enumerate attached devices, open a report channel
//! - `PanelPort`: write/read raw HID reports on an opened device
//!
//! The rest of the daemon only sees `DeviceDescriptor`s and boxed ports, so
//! inventory and device logic can be tested without hardware.

use std::ffi::CString;
use std::sync::Mutex;

use common::{Error, Result};
use hidapi::{HidApi, HidDevice};
use protocol::{DeviceDescriptor, PanelModel};
use tracing::trace;

/// Raw report channel to one opened panel.
///
/// The first byte of every outgoing report is the HID report ID. Dropping a
/// port closes the underlying handle.
pub trait PanelPort: Send {
    /// Write one complete output report. Returns the number of bytes accepted.
    fn write_report(&self, report: &[u8]) -> Result<usize>;

    /// Read one input report into `buf`, waiting at most `timeout_ms`.
    /// Returns the number of bytes read (0 on timeout).
    fn read_report(&self, buf: &mut [u8], timeout_ms: i32) -> Result<usize>;
}

/// Enumeration and open access to attached HID devices.
pub trait PanelPlatform: Send + Sync {
    /// List every attached HID device. Filtering to supported models is the
    /// caller's job; descriptors for unrecognized models carry a zeroed
    /// report geometry and must not be opened.
    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>>;

    /// Open a report channel to the device at `descriptor.path`.
    fn open(&self, descriptor: &DeviceDescriptor) -> Result<Box<dyn PanelPort>>;
}

/// `PanelPlatform` backed by the system HID stack via hidapi.
pub struct HidPlatform {
    // refresh_devices needs &mut, so the handle lives behind a mutex
    api: Mutex<HidApi>,
}

impl HidPlatform {
    pub fn new() -> Result<Self> {
        let api = HidApi::new().map_err(|e| Error::Hid(format!("HID init failed: {e}")))?;
        Ok(Self {
            api: Mutex::new(api),
        })
    }
}

impl PanelPlatform for HidPlatform {
    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>> {
        let mut api = self
            .api
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        api.refresh_devices()
            .map_err(|e| Error::Hid(format!("HID enumeration failed: {e}")))?;

        let mut descriptors = Vec::new();
        for info in api.device_list() {
            let geometry = PanelModel::from_ids(info.vendor_id(), info.product_id())
                .map(|model| model.report_geometry())
                .unwrap_or_default();

            descriptors.push(DeviceDescriptor {
                path: info.path().to_string_lossy().into_owned(),
                vendor_id: info.vendor_id(),
                product_id: info.product_id(),
                geometry,
                manufacturer: info.manufacturer_string().map(str::to_owned),
                product: info.product_string().map(str::to_owned),
                serial_number: info.serial_number().map(str::to_owned),
            });
        }

        trace!(count = descriptors.len(), "HID enumeration pass");
        Ok(descriptors)
    }

    fn open(&self, descriptor: &DeviceDescriptor) -> Result<Box<dyn PanelPort>> {
        let path = CString::new(descriptor.path.as_bytes())
            .map_err(|_| Error::Hid(format!("device path contains NUL: {}", descriptor.path)))?;

        let api = self
            .api
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let device = api
            .open_path(&path)
            .map_err(|e| Error::Hid(format!("open {} failed: {e}", descriptor.path)))?;

        Ok(Box::new(HidPort { device }))
    }
}

/// One opened HID device handle.
struct HidPort {
    device: HidDevice,
}

impl PanelPort for HidPort {
    fn write_report(&self, report: &[u8]) -> Result<usize> {
        self.device
            .write(report)
            .map_err(|e| Error::Hid(format!("report write failed: {e}")))
    }

    fn read_report(&self, buf: &mut [u8], timeout_ms: i32) -> Result<usize> {
        self.device
            .read_timeout(buf, timeout_ms)
            .map_err(|e| Error::Hid(format!("report read failed: {e}")))
    }
}
