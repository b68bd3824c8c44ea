//! Adapter implementations for workspace ports.

pub mod capability_fs;
pub mod memory;
pub mod simulated;

pub use capability_fs::CapabilityFilesystem;
pub use simulated::{ReviewGateway, SimulatedReviewStore, SimulatedReviewSystem};
