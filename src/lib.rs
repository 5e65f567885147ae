//! # Cluster Topology
//!
//! Tracks which entities are live on which member of a cluster and streams the resulting
//! `cluster → member → shard → entity` tree to observers.
//!
//! ## Design
//!
//! ### 1. One actor per entity
//! Every entity id is hosted by its own task behind a [`ShardRegion`](actor_framework::ShardRegion).
//! Messages for one id are handled strictly in order; different ids run in parallel. An
//! entity idle for the configured window asks the region to evict it, and only announces its
//! departure once the region has stopped routing to it.
//!
//! ### 2. One writer for the tree
//! Start and stop events from local entities and from peers all go through the
//! [`TopologyAggregator`](aggregator::TopologyAggregator). It applies them in arrival order,
//! publishes an immutable snapshot after each one, and fans first-hand events out to the
//! other members that are up. Fan-out is best effort; the tree on each member converges once
//! events are delivered, nothing stronger.
//!
//! ### 3. Readers never block the writer
//! The feed server and the `/topology` route read the latest published snapshot through a
//! [`TopologyView`](aggregator::TopologyView).
//!
//! ## Module Tour
//!
//! - [`topology`]: the tree itself and its placement rules.
//! - [`model`]: ids, entities, requests and lifecycle events.
//! - [`entity_actor`]: the per-entity state machine.
//! - [`aggregator`]: the tree's single writer and the fan-out.
//! - [`cluster`]: membership, heartbeat and event transports.
//! - [`clients`]: the typed entity client.
//! - [`feed`]: HTTP routes and the `/events` socket.
//! - [`lifecycle`]: starting and stopping a member, plus synthetic traffic.
//! - [`config`]: command line and environment.
//!
//! ### Running a member
//!
//! ```bash
//! RUST_LOG=info cargo run -- --port 8080 --peers 127.0.0.1:8081 --traffic
//! RUST_LOG=info cargo run -- --port 8081 --peers 127.0.0.1:8080
//! ```
//!
//! Then open `http://127.0.0.1:8080/monitor`.

pub mod aggregator;
pub mod clients;
pub mod cluster;
pub mod config;
pub mod entity_actor;
pub mod feed;
pub mod lifecycle;
pub mod model;
pub mod topology;
