//! Orchestration: starting, wiring and stopping the parts of a member.

pub mod topology_system;
pub mod traffic;

pub use topology_system::{ShutdownError, SystemSettings, TopologySystem};
pub use traffic::{TrafficGenerator, TrafficSettings};
