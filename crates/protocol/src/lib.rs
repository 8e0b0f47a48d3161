//! Protocol library for simpanel
//!
//! This crate holds the two narrow wire shapes the sync daemon speaks:
//! the telemetry feed coming in from the simulator bridge, and the LED
//! output report going out to the panel hardware. It also owns the
//! static panel identity table (vendor/product IDs and report geometry).
//! Everything here is pure and I/O-free.
//!
//! # Feed datagrams
//!
//! ```
//! use protocol::{FeedMessage, TelemetrySnapshot};
//! use protocol::{encode_datagram, decode_datagram};
//!
//! let msg = FeedMessage::Snapshot(TelemetrySnapshot::new(37.0, 0.0, true));
//! let datagram = encode_datagram(&msg).unwrap();
//! let decoded = decode_datagram(&datagram).unwrap();
//! assert_eq!(decoded, msg);
//! ```
//!
//! # LED reports
//!
//! ```
//! use protocol::{Led, LedIntensity, LedMask, build_led_report};
//!
//! let mut mask = LedMask::EMPTY;
//! mask.set(Led::Led1);
//! mask.set(Led::Backlight);
//!
//! let report = build_led_report(mask, LedIntensity::ExtraLow, 36).unwrap();
//! assert_eq!(report.len(), 36);
//! assert_eq!(report[2], 0x04 | 0x08);
//! ```

pub mod codec;
pub mod error;
pub mod ids;
pub mod leds;
pub mod report;
pub mod telemetry;
pub mod types;

pub use codec::{
    FEED_MAGIC, FEED_VERSION, MAX_DATAGRAM_SIZE, MIN_DATAGRAM_SIZE, decode_datagram,
    encode_datagram,
};
pub use error::{ProtocolError, ReportError, Result};
pub use ids::{PanelModel, THRUSTMASTER_VENDOR_ID, product_ids};
pub use leds::{FLAP_LEDS, GEAR_LED, Led, LedIntensity, LedMask};
pub use report::{LED_COMMAND, REPORT_HEADER_LEN, REPORT_ID, build_led_report, ensure_report_len};
pub use telemetry::{FeedMessage, TelemetrySnapshot};
pub use types::{DeviceDescriptor, ReportGeometry};
