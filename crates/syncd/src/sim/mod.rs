//! Simulator feed subsystem
//!
//! Connects the daemon to the telemetry bridge and turns its pushes into
//! coordinator events:
//! - `transport`: the subscribe/ack handshake and datagram framing
//! - `link`: the tri-state connection machine and its receive task

pub mod link;
pub mod transport;

// Re-export public types
pub use link::{CONNECT_TIMEOUT, ConnectionStatus, TelemetryLink};
pub use transport::{SimSession, SimTransport, UdpFeedTransport};
