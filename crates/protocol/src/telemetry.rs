//! Telemetry feed message definitions
//!
//! The simulator bridge pushes one [`TelemetrySnapshot`] per change of
//! value. Snapshots are fire-and-forget: a missed one is superseded by
//! the next, so there is no sequencing or retransmission here.

use serde::{Deserialize, Serialize};

/// One immutable reading of simulated aircraft state
///
/// Percent fields are nominally 0 to 100 but arrive from an untrusted
/// feed; consumers clamp rather than reject out-of-range values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Flap handle position in percent (0 retracted, 100 fully extended)
    pub flaps_pct: f64,
    /// Landing gear position in percent (0 retracted, 100 down and
    /// locked, anything between means in transit)
    pub gear_pct: f64,
    /// Cabin/interior light master switch
    pub interior_light: bool,
}

impl TelemetrySnapshot {
    pub fn new(flaps_pct: f64, gear_pct: f64, interior_light: bool) -> Self {
        Self {
            flaps_pct,
            gear_pct,
            interior_light,
        }
    }
}

/// Messages exchanged with the telemetry bridge
///
/// The daemon sends `Subscribe` once per connection attempt; the bridge
/// answers `SubscribeAck` and then pushes `Snapshot` datagrams until
/// either side goes away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedMessage {
    /// Request change-of-value pushes, refreshed at most every `refresh_ms`
    Subscribe { refresh_ms: u32 },
    /// Bridge accepted the subscription
    SubscribeAck,
    /// One telemetry push
    Snapshot(TelemetrySnapshot),
}
