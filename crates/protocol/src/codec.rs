//! Feed datagram serialization and deserialization using postcard
//!
//! This module frames [`FeedMessage`]s for the UDP telemetry feed.
//! Payloads are serialized with postcard (compact binary format) and
//! wrapped with a magic/version header and a CRC32 trailer so a stray or
//! corrupted datagram is rejected instead of decoded into garbage.
//!
//! # Datagram Format
//!
//! ```text
//! [Magic: "SPNL"][Version: u8][Payload (postcard serialized)][CRC32: u32 (big-endian)]
//! ```
//!
//! The checksum covers everything before the trailer. Datagrams are
//! capped well below a single unfragmented UDP payload.

use crate::error::{ProtocolError, Result};
use crate::telemetry::FeedMessage;

/// First four bytes of every feed datagram
pub const FEED_MAGIC: [u8; 4] = *b"SPNL";

/// Wire version this codec speaks
pub const FEED_VERSION: u8 = 1;

/// Maximum allowed datagram size, far under the common 1500 byte MTU
pub const MAX_DATAGRAM_SIZE: usize = 512;

/// Magic plus version byte
const HEADER_LEN: usize = FEED_MAGIC.len() + 1;

/// CRC32 trailer
const TRAILER_LEN: usize = 4;

/// Smallest datagram that can possibly be valid
pub const MIN_DATAGRAM_SIZE: usize = HEADER_LEN + TRAILER_LEN;

fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Encode a feed message into one datagram
pub fn encode_datagram(message: &FeedMessage) -> Result<Vec<u8>> {
    let payload = postcard::to_allocvec(message)?;

    let total = HEADER_LEN + payload.len() + TRAILER_LEN;
    if total > MAX_DATAGRAM_SIZE {
        return Err(ProtocolError::DatagramTooLarge {
            size: total,
            max: MAX_DATAGRAM_SIZE,
        });
    }

    let mut datagram = Vec::with_capacity(total);
    datagram.extend_from_slice(&FEED_MAGIC);
    datagram.push(FEED_VERSION);
    datagram.extend_from_slice(&payload);
    let crc = checksum(&datagram);
    datagram.extend_from_slice(&crc.to_be_bytes());

    Ok(datagram)
}

/// Decode one datagram into a feed message
///
/// Rejects short, oversized, foreign, stale-version, and corrupted
/// datagrams with distinct errors so the transport can log them apart.
pub fn decode_datagram(datagram: &[u8]) -> Result<FeedMessage> {
    if datagram.len() < MIN_DATAGRAM_SIZE {
        return Err(ProtocolError::TruncatedDatagram {
            expected: MIN_DATAGRAM_SIZE,
            actual: datagram.len(),
        });
    }
    if datagram.len() > MAX_DATAGRAM_SIZE {
        return Err(ProtocolError::DatagramTooLarge {
            size: datagram.len(),
            max: MAX_DATAGRAM_SIZE,
        });
    }

    let magic: [u8; 4] = [datagram[0], datagram[1], datagram[2], datagram[3]];
    if magic != FEED_MAGIC {
        return Err(ProtocolError::BadMagic { found: magic });
    }

    let version = datagram[4];
    if version != FEED_VERSION {
        return Err(ProtocolError::UnsupportedVersion {
            found: version,
            expected: FEED_VERSION,
        });
    }

    let body_len = datagram.len() - TRAILER_LEN;
    let expected = u32::from_be_bytes([
        datagram[body_len],
        datagram[body_len + 1],
        datagram[body_len + 2],
        datagram[body_len + 3],
    ]);
    let computed = checksum(&datagram[..body_len]);
    if expected != computed {
        return Err(ProtocolError::ChecksumMismatch { expected, computed });
    }

    let payload = &datagram[HEADER_LEN..body_len];
    postcard::from_bytes(payload).map_err(ProtocolError::from)
}
