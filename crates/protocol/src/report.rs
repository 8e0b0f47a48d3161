//! Output report construction for the LED block
//!
//! # Report layout
//!
//! Every LED write is one full output report:
//!
//! ```text
//! [Report ID: 0x01][Command: 0x06][LED bitmask][Intensity][zero padding]
//! ```
//!
//! padded to the device's declared output report length. The device
//! rejects partial reports, so the builder always produces exactly
//! `output_len` bytes and the write path re-checks the length before
//! handing the buffer to the HID stack.

use crate::error::ReportError;
use crate::leds::{LedIntensity, LedMask};

/// HID report ID carried in byte 0 of every output report
pub const REPORT_ID: u8 = 0x01;

/// Command selector for the LED block
pub const LED_COMMAND: u8 = 0x06;

/// Bytes before the zero padding: report ID, command, bitmask, intensity
pub const REPORT_HEADER_LEN: usize = 4;

/// Build one full LED output report of exactly `output_len` bytes
///
/// Fails if `output_len` cannot hold the fixed header. The length comes
/// from the model's declared geometry, so a failure here is a wiring
/// mistake, not a runtime condition.
pub fn build_led_report(
    mask: LedMask,
    intensity: LedIntensity,
    output_len: usize,
) -> Result<Vec<u8>, ReportError> {
    if output_len < REPORT_HEADER_LEN {
        return Err(ReportError::GeometryTooSmall {
            output_len,
            min: REPORT_HEADER_LEN,
        });
    }

    let mut report = vec![0u8; output_len];
    report[0] = REPORT_ID;
    report[1] = LED_COMMAND;
    report[2] = mask.bits();
    report[3] = intensity.level();
    Ok(report)
}

/// Reject a report buffer whose length differs from the declared output
/// report length
///
/// Mirrors the check the device firmware performs; catching it here turns
/// a silent hardware NAK into an explicit error.
pub fn ensure_report_len(report: &[u8], expected: usize) -> Result<(), ReportError> {
    if report.len() != expected {
        return Err(ReportError::LengthMismatch {
            expected,
            actual: report.len(),
        });
    }
    Ok(())
}
