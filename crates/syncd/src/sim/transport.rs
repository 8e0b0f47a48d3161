//! Telemetry transport boundary
//!
//! The link state machine never touches a socket directly: it drives a
//! `SimTransport`, which performs the subscribe handshake and hands back
//! a session streaming snapshots. The shipped implementation speaks the
//! UDP feed datagram format from `protocol::codec`; tests plug in a
//! scripted transport.

use std::future::Future;
use std::time::Duration;

use common::{Error, Result};
use protocol::{
    FeedMessage, MAX_DATAGRAM_SIZE, TelemetrySnapshot, decode_datagram, encode_datagram,
};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Interval between subscribe probes while waiting for the bridge
const SUBSCRIBE_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Opens telemetry sessions
pub trait SimTransport: Send + Sync + 'static {
    type Session: SimSession;

    /// Perform the subscribe handshake
    ///
    /// Resolves once the feed acknowledges. Callers bound the wait; this
    /// future may probe indefinitely on its own.
    fn open(&self, refresh_ms: u32) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// One established telemetry session
///
/// Dropping a session closes it.
pub trait SimSession: Send + 'static {
    /// Next telemetry snapshot
    ///
    /// An error means the session is dead and the link should tear down.
    fn recv(&mut self) -> impl Future<Output = Result<TelemetrySnapshot>> + Send;
}

/// UDP datagram client for the local telemetry bridge feed
pub struct UdpFeedTransport {
    server: String,
}

impl UdpFeedTransport {
    /// `server` is a `host:port` pair, resolved at each connection attempt
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
        }
    }
}

impl SimTransport for UdpFeedTransport {
    type Session = UdpFeedSession;

    fn open(&self, refresh_ms: u32) -> impl Future<Output = Result<Self::Session>> + Send {
        let server = self.server.clone();
        async move {
            let socket = UdpSocket::bind("0.0.0.0:0").await?;
            socket.connect(&server).await?;

            let subscribe = encode_datagram(&FeedMessage::Subscribe { refresh_ms })
                .map_err(|e| Error::Other(format!("subscribe encode failed: {e}")))?;

            let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
            loop {
                socket.send(&subscribe).await?;
                debug!(server = %server, "subscribe sent, waiting for ack");

                match timeout(SUBSCRIBE_RETRY_INTERVAL, socket.recv(&mut buf)).await {
                    Ok(Ok(len)) => match decode_datagram(&buf[..len]) {
                        Ok(FeedMessage::SubscribeAck) => {
                            debug!(server = %server, "subscription acknowledged");
                            return Ok(UdpFeedSession { socket, buf });
                        }
                        Ok(other) => {
                            debug!(message = ?other, "ignoring pre-ack datagram");
                        }
                        Err(e) => {
                            warn!(error = %e, "rejected handshake datagram");
                        }
                    },
                    Ok(Err(e)) => return Err(e.into()),
                    // no answer yet, probe again
                    Err(_) => {}
                }
            }
        }
    }
}

/// Established UDP feed subscription
pub struct UdpFeedSession {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl SimSession for UdpFeedSession {
    fn recv(&mut self) -> impl Future<Output = Result<TelemetrySnapshot>> + Send {
        async move {
            loop {
                let len = self.socket.recv(&mut self.buf).await?;
                match decode_datagram(&self.buf[..len]) {
                    Ok(FeedMessage::Snapshot(snapshot)) => return Ok(snapshot),
                    Ok(other) => {
                        debug!(message = ?other, "ignoring non-snapshot datagram");
                    }
                    Err(e) => {
                        // corrupt or foreign datagram, drop it and keep listening
                        warn!(error = %e, "rejected feed datagram");
                    }
                }
            }
        }
    }
}
