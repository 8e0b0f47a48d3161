//! Managed panel abstraction
//!
//! A `PanelDevice` is the software twin of one attached, supported panel.
//! The inventory constructs one per physical device and the coordinator
//! fans telemetry out to all of them without knowing the model.

use common::Result;
use protocol::{DeviceDescriptor, TelemetrySnapshot};

/// One managed panel instance
///
/// Implementations own their opened port exclusively and keep their LED
/// state consistent with the last telemetry snapshot they were handed.
pub trait PanelDevice: Send + Sync {
    /// Identity the device was constructed from
    fn descriptor(&self) -> &DeviceDescriptor;

    /// Log-friendly identification line
    fn identity(&self) -> String {
        self.descriptor().identity()
    }

    /// Drive the hardware to the all-off baseline
    ///
    /// Called exactly once when a device first appears, and again on
    /// daemon shutdown.
    fn reset_state(&self) -> Result<()>;

    /// Recompute LED state from a telemetry snapshot and push it out
    ///
    /// Transient write failures are logged and swallowed so one bad
    /// device never stalls the fan-out.
    fn update_state(&self, snapshot: &TelemetrySnapshot);

    /// Stop background work and drop the port
    ///
    /// Safe to call more than once; writes issued after release fail
    /// soft and background tasks notice within one period.
    fn release(&self);
}
