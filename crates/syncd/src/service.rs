//! Sync coordinator
//!
//! One event loop owns the daemon lifecycle:
//!
//! ```text
//! rescan task ----PanelsChanged----+
//! telemetry link --SimConnected----+--> run() --> fan out to panels
//!              \---SimDisconnected-+        \---> derived status watch
//!              \---Telemetry-------+
//! ```
//!
//! The loop is the only consumer of events and the only writer of the
//! derived status, so observers see transitions in arrival order. The
//! simulator retry loop and the hot-plug rescan run as child tasks of
//! one shutdown token; `shutdown` tears everything down in a fixed
//! order and leaves the panels dark.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use common::{SyncEvent, SyncStatus};
use protocol::TelemetrySnapshot;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::panel::PanelInventory;
use crate::sim::{SimTransport, TelemetryLink};

/// Interval between connection attempts while the simulator is away
pub const RETRY_INTERVAL: Duration = Duration::from_secs(5);

struct BackgroundTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

fn lock_slot(slot: &Mutex<Option<BackgroundTask>>) -> MutexGuard<'_, Option<BackgroundTask>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cancel a background task and reap it within `grace`
fn stop_task(slot: &Mutex<Option<BackgroundTask>>, grace: Duration) {
    let task = lock_slot(slot).take();
    if let Some(task) = task {
        task.cancel.cancel();
        let abort = task.handle.abort_handle();
        tokio::spawn(async move {
            if timeout(grace, task.handle).await.is_err() {
                abort.abort();
            }
        });
    }
}

/// Coordinator tying the telemetry link to the panel inventory
pub struct SyncService<T: SimTransport> {
    link: Arc<TelemetryLink<T>>,
    inventory: Arc<PanelInventory>,
    event_tx: mpsc::UnboundedSender<SyncEvent>,
    events: Mutex<Option<mpsc::UnboundedReceiver<SyncEvent>>>,
    status_tx: watch::Sender<SyncStatus>,
    retry: Mutex<Option<BackgroundTask>>,
    rescan: Mutex<Option<BackgroundTask>>,
    shutdown: CancellationToken,
    rescan_interval: Duration,
}

impl<T: SimTransport> SyncService<T> {
    pub fn new(
        transport: T,
        inventory: Arc<PanelInventory>,
        refresh_ms: u32,
        rescan_interval: Duration,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let link = Arc::new(TelemetryLink::new(transport, refresh_ms, event_tx.clone()));
        let (status_tx, _) = watch::channel(SyncStatus::Off);
        Self {
            link,
            inventory,
            event_tx,
            events: Mutex::new(Some(event_rx)),
            status_tx,
            retry: Mutex::new(None),
            rescan: Mutex::new(None),
            shutdown: CancellationToken::new(),
            rescan_interval,
        }
    }

    /// Watch channel carrying the derived sync status
    ///
    /// Receivers only wake on actual transitions.
    pub fn status_watch(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Drive the coordinator until `shutdown` is called
    ///
    /// Scans for panels once, starts the rescan and retry tasks, then
    /// consumes events. Runs at most once per service instance.
    pub async fn run(&self) {
        self.inventory.refresh().await;
        self.publish_status();
        self.start_rescan();
        self.start_retry();

        let receiver = self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut events) = receiver else {
            warn!("coordinator loop already running");
            return;
        };

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
            }
        }
    }

    fn handle_event(&self, event: SyncEvent) {
        match event {
            SyncEvent::SimConnected => {
                stop_task(&self.retry, RETRY_INTERVAL);
                self.publish_status();
            }
            SyncEvent::SimDisconnected => {
                self.start_retry();
                self.publish_status();
            }
            SyncEvent::Telemetry(snapshot) => self.fan_out(&snapshot),
            SyncEvent::PanelsChanged => self.publish_status(),
        }
    }

    /// Push one snapshot to every managed panel
    ///
    /// Per-device failures are contained inside the device; a dying
    /// panel is only dropped by the rescan, never by a telemetry push.
    fn fan_out(&self, snapshot: &TelemetrySnapshot) {
        for device in self.inventory.devices().iter() {
            device.update_state(snapshot);
        }
    }

    fn publish_status(&self) {
        let status = SyncStatus::derive(!self.inventory.is_empty(), self.link.is_connected());
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            info!(from = %current, to = %status, "sync status changed");
            *current = status;
            true
        });
    }

    /// Spawn the simulator retry loop unless one is already probing
    fn start_retry(&self) {
        let mut slot = lock_slot(&self.retry);
        if slot.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            return;
        }
        if self.link.is_connected() {
            return;
        }

        debug!(
            interval_secs = RETRY_INTERVAL.as_secs(),
            "starting simulator retry loop"
        );
        let cancel = self.shutdown.child_token();
        let token = cancel.clone();
        let link = Arc::clone(&self.link);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = link.connect() => {}
                }
                if link.is_connected() {
                    break;
                }
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(RETRY_INTERVAL) => {}
                }
            }
        });
        *slot = Some(BackgroundTask { cancel, handle });
    }

    /// Spawn the periodic hot-plug rescan
    fn start_rescan(&self) {
        let mut slot = lock_slot(&self.rescan);
        if slot.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            return;
        }

        let cancel = self.shutdown.child_token();
        let token = cancel.clone();
        let inventory = Arc::clone(&self.inventory);
        let events = self.event_tx.clone();
        let period = self.rescan_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // run() already scanned once, skip the immediate tick
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if inventory.refresh().await {
                            let _ = events.send(SyncEvent::PanelsChanged);
                        }
                    }
                }
            }
        });
        *slot = Some(BackgroundTask { cancel, handle });
    }

    /// Orderly shutdown
    ///
    /// Disconnects the simulator, stops rescans so a released panel
    /// cannot be re-adopted, parks every panel dark, then cancels the
    /// remaining tasks and the event loop.
    pub async fn shutdown(&self) {
        info!("sync service shutting down");
        self.link.disconnect();
        stop_task(&self.rescan, self.rescan_interval);
        self.inventory.release_all().await;
        stop_task(&self.retry, RETRY_INTERVAL);
        self.shutdown.cancel();
        self.publish_status();
    }
}
