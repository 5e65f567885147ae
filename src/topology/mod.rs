//! The four-level topology tree: cluster → member → shard → entity.

pub mod tree;

pub use tree::{NodeKind, PrunePolicy, TopologyNode, TopologyTree};
