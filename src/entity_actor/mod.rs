//! Entity lifecycle actor: one [`TrackedEntity`] per entity id, hosted by a `ShardRegion`.
//!
//! ```text
//! Uninitialized ──Command──► Active ──idle window──► Passivating ──► Stopped
//!       │                      │                                       │
//!       └── Query: NotFound    └── emits Start                         └── emits Stop
//! ```
//!
//! `Passivating` and `Stopped` are driven by the framework; this module only decides what a
//! command or query means and which lifecycle events to raise.

pub mod entity;
pub mod error;

pub use entity::{EntityContext, TrackedEntity};
pub use error::*;

use crate::clients::EntityClient;
use actor_framework::{RegionSettings, ShardRegion};

/// Creates the region hosting tracked entities and its client.
///
/// The region does nothing until it is run with an [`EntityContext`].
pub fn new(settings: RegionSettings) -> (ShardRegion<TrackedEntity>, EntityClient) {
    let (region, generic_client) = ShardRegion::new(settings);
    (region, EntityClient::new(generic_client))
}
