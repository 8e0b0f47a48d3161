//! Systemd lifecycle integration
//!
//! sd-notify support for running the daemon as a Type=notify unit:
//! readiness, shutdown and status reporting plus the optional watchdog
//! keepalive. Every call degrades to a no-op when the daemon runs
//! outside systemd.

use anyhow::{Context, Result};
use std::env;
use std::os::unix::net::UnixDatagram;
use tracing::{debug, error, info};

/// Send one sd-notify message if `NOTIFY_SOCKET` is present
///
/// Returns whether a message was actually sent.
fn notify(message: &str) -> Result<bool> {
    let Ok(socket_path) = env::var("NOTIFY_SOCKET") else {
        return Ok(false);
    };
    let socket = UnixDatagram::unbound().context("Failed to create notify socket")?;
    socket
        .send_to(message.as_bytes(), &socket_path)
        .with_context(|| format!("Failed to send '{message}' to systemd"))?;
    Ok(true)
}

/// Notify systemd that startup is complete
///
/// Call once the panel scan and simulator retry loop are running. Only
/// has effect under systemd with Type=notify.
pub fn notify_ready() -> Result<()> {
    if notify("READY=1")? {
        info!("Notified systemd: service ready");
    }
    Ok(())
}

/// Notify systemd that the shutdown sequence has begun
pub fn notify_stopping() -> Result<()> {
    if notify("STOPPING=1")? {
        info!("Notified systemd: service stopping");
    }
    Ok(())
}

/// Publish a status line, visible in `systemctl status` output
pub fn notify_status(status: &str) -> Result<()> {
    if notify(&format!("STATUS={status}"))? {
        debug!(status, "Notified systemd status");
    }
    Ok(())
}

/// Send a watchdog keepalive
///
/// Must be called at least every `WatchdogSec/2` while the watchdog is
/// enabled, or systemd restarts the unit.
pub fn notify_watchdog() -> Result<()> {
    notify("WATCHDOG=1")?;
    Ok(())
}

/// Watchdog timeout configured by systemd, in microseconds
///
/// None when the watchdog is not enabled.
pub fn get_watchdog_timeout() -> Option<u64> {
    env::var("WATCHDOG_USEC").ok().and_then(|s| s.parse().ok())
}

/// Check if running under systemd
pub fn is_systemd() -> bool {
    env::var("NOTIFY_SOCKET").is_ok()
}

/// Spawn the periodic watchdog keepalive task
///
/// Pings at half the configured watchdog interval. When the watchdog is
/// not enabled this returns an already-finished task, so callers can
/// hold and abort the handle unconditionally.
pub fn spawn_watchdog_task() -> tokio::task::JoinHandle<()> {
    let Some(timeout_usec) = get_watchdog_timeout() else {
        debug!("Systemd watchdog not enabled, skipping watchdog task");
        return tokio::spawn(async {});
    };

    let interval_secs = (timeout_usec / 1_000_000) / 2;
    let interval = std::time::Duration::from_secs(interval_secs.max(1));
    info!(
        "Systemd watchdog enabled, interval: {}s (timeout: {}s)",
        interval.as_secs(),
        timeout_usec / 1_000_000
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Err(e) = notify_watchdog() {
                error!("Failed to send watchdog keepalive: {:#}", e);
            }
        }
    })
}
