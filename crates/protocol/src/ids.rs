//! Thrustmaster USB vendor and product ID constants.

use crate::types::ReportGeometry;

/// Thrustmaster USB Vendor ID.
pub const THRUSTMASTER_VENDOR_ID: u16 = 0x044F;

/// Known panel product IDs.
pub mod product_ids {
    /// HOTAS Warthog throttle unit (the half with the LED block and
    /// backlit panel; the stick has no controllable LEDs).
    pub const WARTHOG_THROTTLE: u16 = 0x0404;
}

/// Panel models this engine knows how to drive.
///
/// A model ties a (vendor, product) pair to its fixed report geometry.
/// HID report lengths are not discoverable through hidapi enumeration,
/// so they are declared here per model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelModel {
    WarthogThrottle,
}

impl PanelModel {
    /// Look up the model for a (vendor, product) pair.
    ///
    /// Returns `None` for anything this engine does not drive.
    pub fn from_ids(vendor_id: u16, product_id: u16) -> Option<Self> {
        if vendor_id != THRUSTMASTER_VENDOR_ID {
            return None;
        }
        match product_id {
            product_ids::WARTHOG_THROTTLE => Some(Self::WarthogThrottle),
            _ => None,
        }
    }

    /// USB (vendor, product) pair for this model.
    pub fn ids(self) -> (u16, u16) {
        match self {
            Self::WarthogThrottle => (THRUSTMASTER_VENDOR_ID, product_ids::WARTHOG_THROTTLE),
        }
    }

    /// Fixed input/output report byte lengths, counting the report ID byte.
    pub fn report_geometry(self) -> ReportGeometry {
        match self {
            Self::WarthogThrottle => ReportGeometry {
                input_len: 36,
                output_len: 36,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::WarthogThrottle => "Thrustmaster HOTAS Warthog Throttle",
        }
    }
}
