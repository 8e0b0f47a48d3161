//! Protocol error types

use thiserror::Error;

/// Telemetry feed codec errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Serialization error from postcard
    #[error("Serialization error: {0}")]
    Serialization(#[from] postcard::Error),

    /// Datagram does not start with the feed magic
    #[error("Bad feed magic: {found:02x?}")]
    BadMagic { found: [u8; 4] },

    /// Feed version the decoder does not speak
    #[error("Unsupported feed version: {found} (expected {expected})")]
    UnsupportedVersion { found: u8, expected: u8 },

    /// Datagram length exceeds the maximum allowed size
    #[error("Datagram too large: {size} bytes (max: {max})")]
    DatagramTooLarge { size: usize, max: usize },

    /// Datagram shorter than header plus checksum trailer
    #[error("Truncated datagram: expected at least {expected} bytes, got {actual}")]
    TruncatedDatagram { expected: usize, actual: usize },

    /// CRC32 trailer does not match the datagram contents
    #[error("Checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { expected: u32, computed: u32 },
}

/// Output report construction errors
///
/// These indicate a programming error rather than a runtime condition:
/// report layouts are fixed per device model and never derived from
/// external input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    /// Declared output report length cannot hold the fixed header
    #[error("Output report length {output_len} below minimum {min}")]
    GeometryTooSmall { output_len: usize, min: usize },

    /// Report buffer length differs from the device's declared length
    #[error("Report length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::UnsupportedVersion {
            found: 2,
            expected: 1,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Unsupported feed version"));
        assert!(msg.contains('2'));
        assert!(msg.contains('1'));
    }

    #[test]
    fn test_checksum_mismatch_display() {
        let err = ProtocolError::ChecksumMismatch {
            expected: 0xdead_beef,
            computed: 0x1234_5678,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("0xdeadbeef"));
        assert!(msg.contains("0x12345678"));
    }

    #[test]
    fn test_report_length_mismatch_display() {
        let err = ReportError::LengthMismatch {
            expected: 36,
            actual: 4,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("expected 36"));
        assert!(msg.contains("got 4"));
    }
}
