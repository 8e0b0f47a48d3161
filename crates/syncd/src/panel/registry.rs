//! Supported panel model registry
//!
//! One static table maps USB identity to a device constructor. Supporting
//! another panel model means one new row here plus its `PanelDevice`
//! implementation; enumeration and inventory logic stay untouched.

use std::sync::Arc;

use protocol::{DeviceDescriptor, LedIntensity, PanelModel};

use super::device::PanelDevice;
use super::hal::PanelPort;
use super::throttle::WarthogThrottle;

/// Constructor signature for one supported model
pub type BuildFn = fn(DeviceDescriptor, Box<dyn PanelPort>, LedIntensity) -> Arc<dyn PanelDevice>;

/// One row of the supported model table
pub struct SupportedModel {
    pub model: PanelModel,
    pub build: BuildFn,
}

fn build_warthog(
    descriptor: DeviceDescriptor,
    port: Box<dyn PanelPort>,
    intensity: LedIntensity,
) -> Arc<dyn PanelDevice> {
    Arc::new(WarthogThrottle::new(descriptor, port, intensity))
}

/// Every panel model the daemon can manage
pub static SUPPORTED_MODELS: &[SupportedModel] = &[SupportedModel {
    model: PanelModel::WarthogThrottle,
    build: build_warthog,
}];

/// Registry row for a USB identity, `None` for unsupported hardware
pub fn lookup(vendor_id: u16, product_id: u16) -> Option<&'static SupportedModel> {
    let model = PanelModel::from_ids(vendor_id, product_id)?;
    SUPPORTED_MODELS.iter().find(|entry| entry.model == model)
}
