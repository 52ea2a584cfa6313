//! Test infrastructure for the edgecfgd configuration managers
//!
//! Provides:
//! - A simulated host that models VRF links and addresses
//! - Intent fixtures for common topologies
//! - Command and rendered-config verification helpers

pub mod fixtures;
mod host;
mod verification;

pub use fixtures::*;
pub use host::{SimLink, SimulatedHost};
pub use verification::*;
