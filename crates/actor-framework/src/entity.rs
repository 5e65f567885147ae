//! # ActorEntity Trait
//!
//! The `ActorEntity` trait defines the contract that every keyed entity must implement to be
//! hosted by a [`ShardRegion`](crate::ShardRegion). The region creates one instance per id on
//! first delivery, runs it in its own task, and tears it down after an idle window.
//!
//! # Architecture Note
//! By defining a contract (`ActorEntity`) that every entity type must satisfy, the mailbox
//! loop, the idle timer and the passivation handshake are written *once* in the framework.
//! The entity only decides what a request means for its own state.
//!
//! We use "Associated Types" (type Id, type Request, etc.) to enforce type safety.
//! A region of `Counter` entities only accepts `Counter::Request` payloads and always
//! answers with `Counter::Reply`.
//!
//! # Provided Methods (Hooks)
//! - [`ActorEntity::on_stop`] runs exactly once when the instance is torn down, whether
//!   from passivation or from region shutdown. The default implementation does nothing.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any keyed entity must implement to be managed by a `ShardRegion`.
///
/// # Async & Context
/// This trait is `#[async_trait]` to allow asynchronous work in handlers (e.g. notifying
/// other actors). The `Context` type is shared by every instance of the region and is
/// injected into every call. It is handed to [`ShardRegion::run`](crate::ShardRegion::run),
/// not to the constructor ("Late Binding").
#[async_trait]
pub trait ActorEntity: Send + 'static {
    /// The routing key of this entity (e.g., String, Uuid, u64).
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;

    /// Messages the entity accepts.
    type Request: Send + Debug + 'static;

    /// Replies produced for every accepted request.
    type Reply: Send + Debug + 'static;

    /// The runtime context (dependencies) shared by all instances of the region.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync + 'static;

    /// The error type for this entity.
    ///
    /// # Design Note: Error Granularity
    ///
    /// One error enum per entity type rather than one per request kind. Clients deal with a
    /// single error type and can downcast it out of [`FrameworkError::EntityError`](crate::FrameworkError::EntityError).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct a fresh, not yet initialized instance for `id`.
    /// Called by the region when the first message for `id` arrives.
    fn new_instance(id: Self::Id) -> Self;

    /// Handle one request. Requests for one id are never processed concurrently.
    async fn handle(
        &mut self,
        request: Self::Request,
        ctx: &Self::Context,
    ) -> Result<Self::Reply, Self::Error>;

    // --- Lifecycle Hooks (Async) ---

    /// Called once after the mailbox has been closed and drained.
    async fn on_stop(&mut self, _ctx: &Self::Context) {}
}
