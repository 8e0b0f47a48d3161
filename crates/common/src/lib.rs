//! Common utilities for simpanel
//!
//! This crate provides shared functionality between the sync daemon's
//! subsystems: the coordinator event types and derived status, error
//! handling, logging setup, and test helpers used across crates.

pub mod error;
pub mod events;
pub mod logging;
pub mod test_utils;

pub use error::{Error, Result};
pub use events::{SyncEvent, SyncStatus};
pub use logging::setup_logging;
