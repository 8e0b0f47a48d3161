//! Hot-plug inventory of managed panels
//!
//! Reconciles "what is physically attached" against "what we manage" on
//! every rescan trigger:
//! 1. enumerate all attached HID descriptors
//! 2. reuse the existing instance for every path we already manage
//! 3. open + construct + reset newly appeared supported devices
//! 4. release devices whose path disappeared
//! 5. swap the managed list atomically
//!
//! Readers (the telemetry fan-out) load the list lock-free through an
//! `ArcSwap`; passes are serialized by one async mutex so there is a
//! single writer. An enumeration failure keeps the previous inventory.

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use protocol::LedIntensity;
use tracing::{info, warn};

use super::device::PanelDevice;
use super::hal::PanelPlatform;
use super::registry;

pub struct PanelInventory {
    platform: Arc<dyn PanelPlatform>,
    devices: ArcSwap<Vec<Arc<dyn PanelDevice>>>,
    refresh_lock: tokio::sync::Mutex<()>,
    led_intensity: LedIntensity,
}

impl PanelInventory {
    pub fn new(platform: Arc<dyn PanelPlatform>, led_intensity: LedIntensity) -> Self {
        Self {
            platform,
            devices: ArcSwap::from_pointee(Vec::new()),
            refresh_lock: tokio::sync::Mutex::new(()),
            led_intensity,
        }
    }

    /// Currently managed devices, in enumeration order
    pub fn devices(&self) -> Arc<Vec<Arc<dyn PanelDevice>>> {
        self.devices.load_full()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.load().is_empty()
    }

    /// One reconciliation pass. Returns true when membership changed.
    pub async fn refresh(&self) -> bool {
        let _guard = self.refresh_lock.lock().await;

        let descriptors = match self.platform.enumerate() {
            Ok(descriptors) => descriptors,
            Err(e) => {
                warn!(error = %e, "panel enumeration failed, keeping previous inventory");
                return false;
            }
        };

        let previous = self.devices.load_full();
        let mut next: Vec<Arc<dyn PanelDevice>> = Vec::new();

        for descriptor in descriptors {
            // multi-interface devices enumerate once per interface
            if next
                .iter()
                .any(|device| device.descriptor().path == descriptor.path)
            {
                continue;
            }

            if let Some(existing) = previous
                .iter()
                .find(|device| device.descriptor().path == descriptor.path)
            {
                next.push(Arc::clone(existing));
                continue;
            }

            let Some(entry) = registry::lookup(descriptor.vendor_id, descriptor.product_id) else {
                continue;
            };

            let port = match self.platform.open(&descriptor) {
                Ok(port) => port,
                Err(e) => {
                    warn!(device = %descriptor.identity(), error = %e, "open failed, skipping panel");
                    continue;
                }
            };

            info!(model = entry.model.name(), device = %descriptor.identity(), "panel attached");
            let device = (entry.build)(descriptor, port, self.led_intensity);
            if let Err(e) = device.reset_state() {
                warn!(device = %device.identity(), error = %e, "reset on attach failed");
            }
            next.push(device);
        }

        let next_paths: HashSet<&str> = next
            .iter()
            .map(|device| device.descriptor().path.as_str())
            .collect();
        for removed in previous
            .iter()
            .filter(|device| !next_paths.contains(device.descriptor().path.as_str()))
        {
            info!(device = %removed.identity(), "panel detached");
            removed.release();
        }

        let changed = {
            let previous_paths: HashSet<&str> = previous
                .iter()
                .map(|device| device.descriptor().path.as_str())
                .collect();
            previous_paths != next_paths
        };

        self.devices.store(Arc::new(next));
        changed
    }

    /// Reset every managed panel to the all-off baseline and drop its port
    ///
    /// Shutdown path; the inventory is empty afterwards.
    pub async fn release_all(&self) {
        let _guard = self.refresh_lock.lock().await;
        let devices = self.devices.load_full();
        for device in devices.iter() {
            if let Err(e) = device.reset_state() {
                warn!(device = %device.identity(), error = %e, "reset on shutdown failed");
            }
            device.release();
        }
        self.devices.store(Arc::new(Vec::new()));
    }
}
