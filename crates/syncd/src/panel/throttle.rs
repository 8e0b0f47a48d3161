//! Warthog throttle LED state machine
//!
//! Keeps one attached HOTAS Warthog throttle in sync with telemetry:
//! - flap position maps to a level encoding on the four flap indicators
//!   (floor(percent / 25) of them lit, top down)
//! - landing gear maps to the gear indicator: off retracted, solid
//!   extended, blinking while in transit
//! - the interior-light flag mirrors onto the panel backlight
//!
//! Logical state (bitmask, intensity, blinking subset) lives under one
//! lock; every update pushes one full output report. A background blink
//! task toggles the blinking subset every `BLINK_PERIOD` and rewrites the
//! report. The task self-terminates when the blinking set empties or the
//! port goes away, and release cancels it with a bounded wait.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use common::{Error, Result};
use protocol::{
    DeviceDescriptor, FLAP_LEDS, GEAR_LED, Led, LedIntensity, LedMask, TelemetrySnapshot,
    build_led_report, ensure_report_len,
};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::device::PanelDevice;
use super::hal::PanelPort;

/// Toggle cadence for blinking indicators
pub const BLINK_PERIOD: Duration = Duration::from_millis(300);

/// Flap travel covered by each indicator step, in percent
const FLAP_STEP_PCT: f64 = 25.0;

/// Logical LED state, only touched under the state lock
#[derive(Debug, Clone, Copy)]
struct LedState {
    mask: LedMask,
    intensity: LedIntensity,
    blinking: LedMask,
}

/// State shared with the blink task
struct ThrottleShared {
    descriptor: DeviceDescriptor,
    configured_intensity: LedIntensity,
    state: Mutex<LedState>,
    port: Mutex<Option<Box<dyn PanelPort>>>,
}

struct BlinkTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Managed HOTAS Warthog throttle
pub struct WarthogThrottle {
    shared: Arc<ThrottleShared>,
    blink: Mutex<Option<BlinkTask>>,
}

/// Number of flap indicators to light for a flap position
///
/// Out-of-range telemetry clamps to the nearest end of the scale instead
/// of leaving stale indicators behind.
fn flap_level(flaps_pct: f64) -> usize {
    let bucket = (flaps_pct / FLAP_STEP_PCT).floor() as i64;
    bucket.clamp(0, FLAP_LEDS.len() as i64) as usize
}

/// Set the first `flap_level` flap indicators, clear the rest
fn apply_flaps(mask: &mut LedMask, flaps_pct: f64) {
    let level = flap_level(flaps_pct);
    for (index, led) in FLAP_LEDS.iter().enumerate() {
        mask.set_to(*led, index < level);
    }
}

/// Gear indicator: solid at the endpoints, blinking in between
///
/// Entering transit leaves the mask bit alone, so the current on/off
/// state becomes the initial blink phase.
fn apply_gear(mask: &mut LedMask, blinking: &mut LedMask, gear_pct: f64) {
    if gear_pct == 0.0 {
        mask.clear(GEAR_LED);
        blinking.clear(GEAR_LED);
    } else if gear_pct == 100.0 {
        mask.set(GEAR_LED);
        blinking.clear(GEAR_LED);
    } else {
        blinking.set(GEAR_LED);
    }
}

fn apply_backlight(mask: &mut LedMask, interior_light: bool) {
    mask.set_to(Led::Backlight, interior_light);
}

impl ThrottleShared {
    fn lock_state(&self) -> MutexGuard<'_, LedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand one prebuilt report to the port
    fn write_report(&self, report: &[u8]) -> Result<()> {
        let expected = self.descriptor.geometry.output_len;
        debug_assert_eq!(report.len(), expected, "LED report built with wrong length");
        ensure_report_len(report, expected).map_err(|e| Error::Hid(e.to_string()))?;

        let port = self.port.lock().unwrap_or_else(PoisonError::into_inner);
        match port.as_ref() {
            Some(port) => {
                port.write_report(report)?;
                Ok(())
            }
            None => Err(Error::Hid("port released".to_string())),
        }
    }

    /// Push the current logical state to the hardware
    fn push_state(&self) -> Result<()> {
        let report = {
            let state = self.lock_state();
            build_led_report(state.mask, state.intensity, self.descriptor.geometry.output_len)
                .map_err(|e| Error::Hid(e.to_string()))?
        };
        self.write_report(&report)
    }

    /// One blink toggle. Returns false when the task should stop.
    fn blink_tick(&self) -> bool {
        let report = {
            let mut state = self.lock_state();
            if state.blinking.is_empty() {
                trace!(device = %self.descriptor.path, "blink set empty, stopping");
                return false;
            }
            let blinking = state.blinking;
            state.mask.toggle_all(blinking);
            match build_led_report(state.mask, state.intensity, self.descriptor.geometry.output_len)
            {
                Ok(report) => report,
                Err(e) => {
                    warn!(device = %self.descriptor.path, error = %e, "blink report build failed");
                    return false;
                }
            }
        };

        if let Err(e) = self.write_report(&report) {
            debug!(device = %self.descriptor.path, error = %e, "blink write failed, stopping");
            return false;
        }
        true
    }
}

impl WarthogThrottle {
    pub fn new(
        descriptor: DeviceDescriptor,
        port: Box<dyn PanelPort>,
        configured_intensity: LedIntensity,
    ) -> Self {
        Self {
            shared: Arc::new(ThrottleShared {
                descriptor,
                configured_intensity,
                state: Mutex::new(LedState {
                    mask: LedMask::EMPTY,
                    intensity: LedIntensity::ExtraLow,
                    blinking: LedMask::EMPTY,
                }),
                port: Mutex::new(Some(port)),
            }),
            blink: Mutex::new(None),
        }
    }

    fn lock_blink(&self) -> MutexGuard<'_, Option<BlinkTask>> {
        self.blink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the blink task unless one is already live
    fn ensure_blinking(&self) {
        let mut slot = self.lock_blink();
        if let Some(task) = slot.as_ref() {
            if !task.handle.is_finished() {
                return;
            }
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(BLINK_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if !shared.blink_tick() {
                            break;
                        }
                    }
                }
            }
            trace!(device = %shared.descriptor.path, "blink task finished");
        });
        *slot = Some(BlinkTask { cancel, handle });
    }

    /// Cancel the blink task, waiting at most one period before aborting
    fn stop_blinking(&self) {
        let Some(task) = self.lock_blink().take() else {
            return;
        };
        task.cancel.cancel();
        let abort = task.handle.abort_handle();
        tokio::spawn(async move {
            if tokio::time::timeout(BLINK_PERIOD, task.handle).await.is_err() {
                abort.abort();
            }
        });
    }
}

impl PanelDevice for WarthogThrottle {
    fn descriptor(&self) -> &DeviceDescriptor {
        &self.shared.descriptor
    }

    fn reset_state(&self) -> Result<()> {
        {
            let mut state = self.shared.lock_state();
            state.mask = LedMask::EMPTY;
            state.blinking = LedMask::EMPTY;
            state.intensity = LedIntensity::ExtraLow;
        }
        self.shared.push_state()
    }

    fn update_state(&self, snapshot: &TelemetrySnapshot) {
        let blinking_now = {
            let mut state = self.shared.lock_state();
            let state = &mut *state;
            apply_flaps(&mut state.mask, snapshot.flaps_pct);
            apply_backlight(&mut state.mask, snapshot.interior_light);
            apply_gear(&mut state.mask, &mut state.blinking, snapshot.gear_pct);
            state.intensity = self.shared.configured_intensity;
            !state.blinking.is_empty()
        };

        if let Err(e) = self.shared.push_state() {
            warn!(device = %self.shared.descriptor.path, error = %e, "LED update write failed");
        }
        if blinking_now {
            self.ensure_blinking();
        }
    }

    fn release(&self) {
        self.stop_blinking();
        let mut port = self
            .shared
            .port
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *port = None;
    }
}
