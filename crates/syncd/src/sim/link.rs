//! Simulator link state machine
//!
//! Tracks one tri-state connection to the telemetry feed and owns the
//! background receive task. Status transitions:
//!
//! ```text
//! Disconnected --connect()--> Pending --handshake ok--> Connected
//!      ^                        |                          |
//!      +----- handshake failed or timed out ---------------+
//!      +----- disconnect() or feed error ------------------+
//! ```
//!
//! `connect` is a no-op unless Disconnected; `disconnect` is safe from
//! any state. Edge events (`SimConnected`/`SimDisconnected`) fire at most
//! once per transition; telemetry is forwarded as it arrives and may
//! trail a disconnect, which consumers tolerate.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use common::SyncEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::transport::{SimSession, SimTransport};

/// Handshake deadline before a connection attempt is abandoned
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Grace period for the receive task to wind down after cancellation
const RECEIVE_STOP_WAIT: Duration = Duration::from_secs(5);

/// Connection state of the telemetry feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Pending,
    Connected,
}

/// State shared with the receive task
struct LinkShared {
    status: Mutex<ConnectionStatus>,
    events: mpsc::UnboundedSender<SyncEvent>,
}

impl LinkShared {
    fn lock_status(&self) -> MutexGuard<'_, ConnectionStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send_event(&self, event: SyncEvent) {
        // a closed receiver means the coordinator is already gone
        let _ = self.events.send(event);
    }

    /// Drive status to Disconnected, emitting the edge event once
    fn drop_to_disconnected(&self) {
        let previous = {
            let mut status = self.lock_status();
            std::mem::replace(&mut *status, ConnectionStatus::Disconnected)
        };
        if previous != ConnectionStatus::Disconnected {
            info!("simulator feed disconnected");
            self.send_event(SyncEvent::SimDisconnected);
        }
    }
}

struct ReceiveTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the simulator connection and its receive task
pub struct TelemetryLink<T: SimTransport> {
    transport: T,
    refresh_ms: u32,
    shared: Arc<LinkShared>,
    receive: Mutex<Option<ReceiveTask>>,
}

impl<T: SimTransport> TelemetryLink<T> {
    pub fn new(transport: T, refresh_ms: u32, events: mpsc::UnboundedSender<SyncEvent>) -> Self {
        Self {
            transport,
            refresh_ms,
            shared: Arc::new(LinkShared {
                status: Mutex::new(ConnectionStatus::Disconnected),
                events,
            }),
            receive: Mutex::new(None),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.shared.lock_status()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Try to bring the link up
    ///
    /// No-op unless currently Disconnected. Failure is logged and leaves
    /// the link Disconnected for the retry loop to pick up.
    pub async fn connect(&self) {
        {
            let mut status = self.shared.lock_status();
            if *status != ConnectionStatus::Disconnected {
                return;
            }
            *status = ConnectionStatus::Pending;
        }

        match timeout(CONNECT_TIMEOUT, self.transport.open(self.refresh_ms)).await {
            Ok(Ok(session)) => {
                {
                    let mut status = self.shared.lock_status();
                    if *status != ConnectionStatus::Pending {
                        // torn down mid-handshake, discard the session
                        debug!("connection discarded, link was closed during handshake");
                        return;
                    }
                    *status = ConnectionStatus::Connected;
                }
                info!("simulator feed connected");
                self.shared.send_event(SyncEvent::SimConnected);
                self.spawn_receive(session);
            }
            Ok(Err(e)) => {
                debug!(error = %e, "simulator handshake failed");
                self.shared.drop_to_disconnected();
            }
            Err(_) => {
                debug!(timeout_secs = CONNECT_TIMEOUT.as_secs(), "simulator handshake timed out");
                self.shared.drop_to_disconnected();
            }
        }
    }

    /// Tear the link down. Safe from any state; always ends Disconnected.
    pub fn disconnect(&self) {
        let task = self
            .receive
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.cancel.cancel();
            let abort = task.handle.abort_handle();
            tokio::spawn(async move {
                if timeout(RECEIVE_STOP_WAIT, task.handle).await.is_err() {
                    abort.abort();
                }
            });
        }
        self.shared.drop_to_disconnected();
    }

    fn spawn_receive(&self, mut session: T::Session) {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    result = session.recv() => match result {
                        Ok(snapshot) => {
                            trace!(?snapshot, "telemetry received");
                            shared.send_event(SyncEvent::Telemetry(snapshot));
                        }
                        Err(e) => {
                            warn!(error = %e, "simulator feed lost");
                            shared.drop_to_disconnected();
                            break;
                        }
                    }
                }
            }
        });
        *self
            .receive
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(ReceiveTask { cancel, handle });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{FeedStep, OpenStep, ScriptedTransport};
    use protocol::TelemetrySnapshot;

    fn link_with(
        transport: ScriptedTransport,
    ) -> (
        TelemetryLink<ScriptedTransport>,
        mpsc::UnboundedReceiver<SyncEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TelemetryLink::new(transport, 1000, tx), rx)
    }

    #[tokio::test]
    async fn test_connect_delivers_edge_then_telemetry() {
        let transport = ScriptedTransport::new();
        transport.push_open(OpenStep::Session(vec![FeedStep::Snapshot(
            TelemetrySnapshot::new(50.0, 0.0, true),
        )]));
        let (link, mut rx) = link_with(transport);

        link.connect().await;
        assert_eq!(link.status(), ConnectionStatus::Connected);

        assert!(matches!(rx.recv().await, Some(SyncEvent::SimConnected)));
        match rx.recv().await {
            Some(SyncEvent::Telemetry(snapshot)) => {
                assert_eq!(snapshot, TelemetrySnapshot::new(50.0, 0.0, true));
            }
            other => panic!("expected telemetry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_is_idempotent_while_up() {
        let transport = ScriptedTransport::new();
        transport.push_open(OpenStep::Session(vec![]));
        let (link, _rx) = link_with(transport);

        link.connect().await;
        let opens = link.transport.open_count();
        link.connect().await;
        assert_eq!(link.transport.open_count(), opens, "no second handshake");
    }

    #[tokio::test]
    async fn test_refused_handshake_falls_back_to_disconnected() {
        let transport = ScriptedTransport::new();
        transport.push_open(OpenStep::Refuse);
        let (link, mut rx) = link_with(transport);

        link.connect().await;
        assert_eq!(link.status(), ConnectionStatus::Disconnected);
        // the aborted attempt surfaces as a disconnect edge
        assert!(matches!(rx.recv().await, Some(SyncEvent::SimDisconnected)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_handshake_timeout_falls_back_to_disconnected() {
        let transport = ScriptedTransport::new();
        transport.push_open(OpenStep::Hang);
        let (link, _rx) = link_with(transport);

        // paused clock jumps straight over the 30s guard
        link.connect().await;
        assert_eq!(link.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_feed_error_tears_the_link_down() {
        let transport = ScriptedTransport::new();
        transport.push_open(OpenStep::Session(vec![
            FeedStep::Snapshot(TelemetrySnapshot::default()),
            FeedStep::Fail,
        ]));
        let (link, mut rx) = link_with(transport);

        link.connect().await;
        assert!(matches!(rx.recv().await, Some(SyncEvent::SimConnected)));
        assert!(matches!(
            rx.recv().await,
            Some(SyncEvent::Telemetry(_))
        ));
        assert!(matches!(rx.recv().await, Some(SyncEvent::SimDisconnected)));
        assert_eq!(link.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_disconnect_from_disconnected_is_silent() {
        let transport = ScriptedTransport::new();
        let (link, mut rx) = link_with(transport);

        link.disconnect();
        assert_eq!(link.status(), ConnectionStatus::Disconnected);
        assert!(rx.try_recv().is_err(), "no event without a transition");
    }

    #[tokio::test]
    async fn test_disconnect_stops_telemetry() {
        let transport = ScriptedTransport::new();
        transport.push_open(OpenStep::Session(vec![FeedStep::Snapshot(
            TelemetrySnapshot::default(),
        )]));
        let (link, mut rx) = link_with(transport);

        link.connect().await;
        link.disconnect();
        assert_eq!(link.status(), ConnectionStatus::Disconnected);

        // drain: the disconnect edge must arrive, then silence
        let mut saw_disconnect = false;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, SyncEvent::SimDisconnected) {
                saw_disconnect = true;
            }
        }
        assert!(saw_disconnect);
    }
}
