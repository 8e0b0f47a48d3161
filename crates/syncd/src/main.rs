//! simpanel sync daemon
//!
//! Keeps the LEDs of hot-pluggable cockpit panels in sync with simulator
//! telemetry: flap, landing gear and interior light state in over UDP,
//! HID output reports out to the hardware.

mod config;
mod panel;
mod service;
mod sim;
mod systemd;
#[cfg(test)]
mod testkit;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use common::setup_logging;
use tokio::signal;
use tracing::{error, info};

use config::SyncdConfig;
use panel::{HidPlatform, PanelInventory, PanelPlatform};
use service::SyncService;
use sim::UdpFeedTransport;

#[derive(Parser, Debug)]
#[command(name = "simpanel-syncd")]
#[command(
    author,
    version,
    about = "Panel sync daemon - mirror simulator telemetry onto cockpit panel LEDs"
)]
#[command(long_about = "
Keeps the LEDs of attached cockpit panels (Thrustmaster HOTAS Warthog
throttle) in sync with flap, landing gear and interior light telemetry
pushed by a local simulator bridge over UDP.

EXAMPLES:
    # Run with default config
    simpanel-syncd

    # Run with custom config
    simpanel-syncd --config /path/to/syncd.toml

    # List supported panels and attached hardware
    simpanel-syncd --list-panels

    # Run with debug logging
    simpanel-syncd --log-level debug

CONFIGURATION:
    The daemon looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/simpanel/syncd.toml
    3. /etc/simpanel/syncd.toml
    4. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// List supported panel models and attached hardware, then exit
    #[arg(long)]
    list_panels: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --save-config flag early (before loading config)
    if args.save_config {
        let config = SyncdConfig::default();
        let path = SyncdConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    // Load configuration first (to get log level from config if not specified)
    let config = if let Some(ref path) = args.config {
        SyncdConfig::load(Some(path.clone())).context("Failed to load configuration")?
    } else {
        SyncdConfig::load_or_default()
    };

    // Use CLI log level if specified, otherwise use config value
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.daemon.log_level);

    setup_logging(log_level).context("Failed to setup logging")?;

    info!("simpanel-syncd v{}", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", log_level);

    let platform =
        Arc::new(HidPlatform::new().context("Failed to initialize the HID platform")?);

    if args.list_panels {
        return list_panels_mode(platform.as_ref());
    }

    run_daemon(config, platform).await
}

/// Print supported models and any currently attached panel
fn list_panels_mode(platform: &HidPlatform) -> Result<()> {
    println!("Supported panels:");
    for entry in panel::registry::SUPPORTED_MODELS {
        let (vendor_id, product_id) = entry.model.ids();
        let geometry = entry.model.report_geometry();
        println!(
            "  {:04x}:{:04x} - {} ({}-byte reports)",
            vendor_id,
            product_id,
            entry.model.name(),
            geometry.output_len
        );
    }

    let descriptors = platform
        .enumerate()
        .context("Failed to enumerate HID devices")?;
    let attached: Vec<_> = descriptors
        .iter()
        .filter(|descriptor| {
            panel::registry::lookup(descriptor.vendor_id, descriptor.product_id).is_some()
        })
        .collect();

    println!();
    if attached.is_empty() {
        println!(
            "No supported panel attached ({} HID devices present).",
            descriptors.len()
        );
    } else {
        println!("Attached panels:");
        for descriptor in attached {
            println!("  {} at {}", descriptor.identity(), descriptor.path);
        }
    }

    Ok(())
}

/// Run the sync daemon until Ctrl+C
async fn run_daemon(config: SyncdConfig, platform: Arc<HidPlatform>) -> Result<()> {
    info!("Starting panel sync daemon");
    if systemd::is_systemd() {
        info!("Running under systemd");
    }

    let inventory = Arc::new(PanelInventory::new(platform, config.led_intensity()));
    let transport = UdpFeedTransport::new(config.sim_server());
    let service = Arc::new(SyncService::new(
        transport,
        inventory,
        config.sim.refresh_ms,
        config.rescan_interval(),
    ));
    info!(server = %config.sim_server(), "telemetry source configured");

    let watchdog_handle = systemd::spawn_watchdog_task();

    // Mirror status transitions into `systemctl status`
    let mut status_rx = service.status_watch();
    let status_handle = tokio::spawn(async move {
        loop {
            let status = *status_rx.borrow_and_update();
            if let Err(e) = systemd::notify_status(&format!("sync {status}")) {
                error!("Failed to send status to systemd: {:#}", e);
            }
            if status_rx.changed().await.is_err() {
                break;
            }
        }
    });

    let runner = Arc::clone(&service);
    let run_handle = tokio::spawn(async move { runner.run().await });

    systemd::notify_ready().context("Failed to notify systemd ready")?;
    info!("Press Ctrl+C to shutdown");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
        Err(e) => {
            error!("Error waiting for Ctrl+C: {}", e);
        }
    }

    systemd::notify_stopping().context("Failed to notify systemd stopping")?;
    service.shutdown().await;
    let _ = run_handle.await;

    watchdog_handle.abort();
    status_handle.abort();

    info!("Daemon shutdown complete");
    Ok(())
}
