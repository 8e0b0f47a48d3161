//! Panel subsystem
//!
//! Everything between raw HID access and "a set of managed panels":
//! - Platform traits and the hidapi implementation (enumerate, open, write)
//! - The supported-model registry mapping USB identity to a constructor
//! - The per-model LED state machines
//! - The hot-plug inventory that diffs attached hardware against the
//!   managed set
//!
//! ```text
//! PanelInventory
//!   ├─> PanelPlatform::enumerate()          every rescan trigger
//!   ├─> registry::lookup(vid, pid)          new path appeared
//!   │     └─> PanelPlatform::open() + reset_state()
//!   └─> PanelDevice::release()              path disappeared
//! ```

pub mod device;
pub mod hal;
pub mod inventory;
pub mod registry;
pub mod throttle;

// Re-export public types
pub use device::PanelDevice;
pub use hal::{HidPlatform, PanelPlatform, PanelPort};
pub use inventory::PanelInventory;
pub use throttle::WarthogThrottle;
