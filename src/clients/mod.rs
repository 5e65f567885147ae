//! Type-safe wrappers around [`RegionClient`](actor_framework::RegionClient).

pub mod entity_client;

pub use entity_client::*;
