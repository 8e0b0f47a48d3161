//! Test utilities for simpanel
//!
//! Provides descriptor builders and helper functions for testing across
//! crates.
//!
//! # Example
//!
//! ```
//! use common::test_utils::warthog_descriptor;
//!
//! let descriptor = warthog_descriptor("/dev/hidraw7");
//! assert_eq!(descriptor.vendor_id, 0x044F);
//! ```

use std::future::Future;
use std::time::Duration;

use protocol::{DeviceDescriptor, PanelModel, ReportGeometry, THRUSTMASTER_VENDOR_ID, product_ids};

/// Default test timeout (5 seconds)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a descriptor with arbitrary IDs and zeroed geometry
///
/// Useful as the "some other HID device" in inventory tests.
pub fn descriptor(path: &str, vendor_id: u16, product_id: u16) -> DeviceDescriptor {
    DeviceDescriptor {
        path: path.to_string(),
        vendor_id,
        product_id,
        geometry: ReportGeometry::default(),
        manufacturer: Some("Test Manufacturer".to_string()),
        product: Some("Test Product".to_string()),
        serial_number: Some("SN000001".to_string()),
    }
}

/// Create a Warthog throttle descriptor as the real platform would
pub fn warthog_descriptor(path: &str) -> DeviceDescriptor {
    DeviceDescriptor {
        path: path.to_string(),
        vendor_id: THRUSTMASTER_VENDOR_ID,
        product_id: product_ids::WARTHOG_THROTTLE,
        geometry: PanelModel::WarthogThrottle.report_geometry(),
        manufacturer: Some("Thrustmaster".to_string()),
        product: Some("Throttle - HOTAS Warthog".to_string()),
        serial_number: None,
    }
}

/// Create a descriptor for an attached but unsupported device
///
/// A Logitech unified receiver, the kind of thing that shares a desk
/// with a panel.
pub fn unsupported_descriptor(path: &str) -> DeviceDescriptor {
    descriptor(path, 0x046D, 0xC52B)
}

/// Bound an async test step so a regression hangs one step, not the suite
///
/// Generous relative to the intervals under test; under
/// `start_paused` the clock auto-advances and a healthy test never
/// comes close to it.
pub async fn with_timeout<F: Future>(
    duration: Duration,
    future: F,
) -> Result<F::Output, TestDeadline> {
    match tokio::time::timeout(duration, future).await {
        Ok(value) => Ok(value),
        Err(_) => Err(TestDeadline(duration)),
    }
}

/// Marker returned when a bounded test step hangs
#[derive(Debug)]
pub struct TestDeadline(Duration);

impl std::fmt::Display for TestDeadline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no completion within {:?}", self.0)
    }
}

impl std::error::Error for TestDeadline {}
