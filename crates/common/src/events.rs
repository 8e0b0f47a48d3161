//! Coordinator event types and the derived sync status

use std::fmt;

use protocol::TelemetrySnapshot;

/// Events feeding the coordinator loop
///
/// Produced by the telemetry link and the inventory rescan task, consumed
/// by the single coordinator task. Connection transitions arrive at most
/// once per edge; `Telemetry` may still trail a `SimDisconnected` and the
/// consumer has to tolerate that.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// The simulator link completed its handshake
    SimConnected,
    /// The simulator link dropped, deliberately or not
    SimDisconnected,
    /// One telemetry push to fan out to every managed panel
    Telemetry(TelemetrySnapshot),
    /// The set of managed panels changed membership
    PanelsChanged,
}

/// Overall state shown to humans
///
/// Purely derived, never stored: `On` when both a panel and the sim are
/// there, `Off` when neither is, `Warmup` in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Off,
    Warmup,
    On,
}

impl SyncStatus {
    pub fn derive(panel_attached: bool, sim_connected: bool) -> Self {
        match (panel_attached, sim_connected) {
            (true, true) => SyncStatus::On,
            (false, false) => SyncStatus::Off,
            _ => SyncStatus::Warmup,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStatus::Off => "off",
            SyncStatus::Warmup => "warmup",
            SyncStatus::On => "on",
        };
        write!(f, "{name}")
    }
}
