//! Panel identity and capability types
//!
//! This module defines the descriptor types the platform layer produces
//! during enumeration and the inventory consumes when deciding what to
//! manage.

/// Fixed report sizes for one device model
///
/// Both lengths count the leading report ID byte, matching what the HID
/// stack expects on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportGeometry {
    /// Input report length in bytes
    pub input_len: usize,
    /// Output report length in bytes
    pub output_len: usize,
}

/// Identity of one physically attached HID node
///
/// Two descriptors with the same `path` refer to the same physical device
/// across enumeration passes; the path is the identity key for the
/// inventory diff. A replug at the same port typically yields the same
/// path again, which is treated as remove-then-add by consecutive passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Platform device path, stable while the device stays attached
    pub path: String,
    /// USB Vendor ID
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
    /// Declared report sizes; zeroed when the platform cannot determine
    /// them for an unrecognized model (such a device is never opened)
    pub geometry: ReportGeometry,
    /// Manufacturer string (if available)
    pub manufacturer: Option<String>,
    /// Product string (if available)
    pub product: Option<String>,
    /// Serial number string (if available)
    pub serial_number: Option<String>,
}

impl DeviceDescriptor {
    /// Human-readable identification line for logs and `--list-panels`
    pub fn identity(&self) -> String {
        let label = match (self.manufacturer.as_deref(), self.product.as_deref()) {
            (Some(manufacturer), Some(product)) => format!("{manufacturer} {product}"),
            (None, Some(product)) => product.to_string(),
            (Some(manufacturer), None) => manufacturer.to_string(),
            (None, None) => "unnamed device".to_string(),
        };
        match self.serial_number.as_deref() {
            Some(serial) => format!(
                "{label} [{:04x}:{:04x}] (s/n {serial})",
                self.vendor_id, self.product_id
            ),
            None => format!("{label} [{:04x}:{:04x}]", self.vendor_id, self.product_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> DeviceDescriptor {
        DeviceDescriptor {
            path: "/dev/hidraw3".to_string(),
            vendor_id: 0x044F,
            product_id: 0x0404,
            geometry: ReportGeometry {
                input_len: 36,
                output_len: 36,
            },
            manufacturer: Some("Thrustmaster".to_string()),
            product: Some("Throttle - HOTAS Warthog".to_string()),
            serial_number: None,
        }
    }

    #[test]
    fn test_identity_with_strings() {
        let identity = descriptor().identity();
        assert!(identity.contains("Thrustmaster"));
        assert!(identity.contains("044f:0404"));
    }

    #[test]
    fn test_identity_without_strings() {
        let mut desc = descriptor();
        desc.manufacturer = None;
        desc.product = None;
        assert!(desc.identity().starts_with("unnamed device"));
    }

    #[test]
    fn test_identity_includes_serial() {
        let mut desc = descriptor();
        desc.serial_number = Some("TM0001".to_string());
        assert!(desc.identity().contains("s/n TM0001"));
    }
}
