//! # Actor Framework
//!
//! This crate provides the building blocks for hosting many small, keyed, stateful entities
//! on top of Tokio. Each entity id gets its own actor task on first use, processes its
//! messages strictly one at a time, and is evicted after an idle window.
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into three layers:
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - Your per-id state and what a request does to it
//! 2. **Runtime Layer** ([`ShardRegion`]) - Routing by id, actor creation, idle passivation
//! 3. **Interface Layer** ([`RegionClient`], [`ActorClient`]) - Type-safe communication
//!
//! You write the entity logic **once**; the region owns every mailbox, the idle timers and
//! the eviction handshake.
//!
//! ## Lifecycle of an Entity
//!
//! ```text
//!   first message          idle window elapsed        region drops sender
//! ────────────────► Active ───────────────────► Passivating ──────────────► Stopped
//!                     ▲                              │ (drains mailbox,       │
//!                     │      message buffered        │  runs on_stop)         │
//!                     └──── fresh instance ◄─────────┴────────────────────────┘
//! ```
//!
//! Messages that arrive while an id is passivating are buffered by the region and delivered
//! to a fresh instance once the old one has stopped. No message is lost and an instance never
//! overlaps with its successor.
//!
//! ## Example
//!
//! ```rust
//! use actor_framework::{ActorEntity, RegionSettings, ShardRegion};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! struct Counter { total: u64 }
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("counter overflow")]
//! struct CounterError;
//!
//! #[async_trait]
//! impl ActorEntity for Counter {
//!     type Id = String;
//!     type Request = u64;
//!     type Reply = u64;
//!     type Context = ();
//!     type Error = CounterError;
//!
//!     fn new_instance(_id: String) -> Self {
//!         Self { total: 0 }
//!     }
//!
//!     async fn handle(&mut self, n: u64, _ctx: &()) -> Result<u64, CounterError> {
//!         self.total = self.total.checked_add(n).ok_or(CounterError)?;
//!         Ok(self.total)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (region, client) = ShardRegion::<Counter>::new(RegionSettings::default());
//!     let handle = tokio::spawn(region.run(()));
//!
//!     assert_eq!(client.ask("a".into(), 2).await.unwrap(), 2);
//!     assert_eq!(client.ask("a".into(), 3).await.unwrap(), 5);
//!     assert_eq!(client.ask("b".into(), 1).await.unwrap(), 1);
//!
//!     // Dropping the last client stops every entity.
//!     drop(client);
//!     handle.await.unwrap();
//! }
//! ```
//!
//! ## Context Injection Pattern
//!
//! Dependencies are injected at **runtime** via [`ShardRegion::run`], not at construction
//! time. The region and its client can be created first, the client handed to whatever needs
//! it, and the entity context assembled afterwards.
//!
//! ## Concurrency Model
//!
//! - Each entity runs in its own Tokio task
//! - Messages for one id are processed **sequentially** (no locks needed)
//! - Different ids run in **parallel**
//! - A full mailbox is answered with [`FrameworkError::MailboxFull`], never dropped silently
//!
//! ## Testing
//!
//! [`mock::MockClient`] hands out a real [`RegionClient`] backed by scripted replies, for
//! unit tests of client wrappers without spawning a region.

mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod region;
pub mod telemetry;

// Re-export core types for convenience
pub use client::RegionClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{RegionRequest, Response};
pub use region::{RegionSettings, ShardRegion};
pub use telemetry::setup_tracing;
