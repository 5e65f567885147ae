//! # Generic Messages
//!
//! This module defines the message types exchanged between the `RegionClient`, the
//! `ShardRegion` and the per-entity actors.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Requests sent by clients to the region.
///
/// # Routing
/// Every message names the entity it is for. The region owns the mapping from id to live
/// actor, so the client never holds a handle to an individual entity and can never reach
/// an instance that has already started tearing down.
///
/// - **Route**: deliver `request` to the live instance for `id`, creating it if needed.
/// - **Passivate**: ask the region to evict `id` now instead of waiting for the idle window.
/// - **ActiveEntities**: list the ids that currently have a live, non-passivating instance.
#[derive(Debug)]
pub enum RegionRequest<T: ActorEntity> {
    Route {
        id: T::Id,
        request: T::Request,
        respond_to: Response<T::Reply>,
    },
    Passivate {
        id: T::Id,
        respond_to: Response<bool>,
    },
    ActiveEntities {
        respond_to: Response<Vec<T::Id>>,
    },
}

/// A request waiting in one entity's mailbox.
#[derive(Debug)]
pub(crate) struct Delivery<T: ActorEntity> {
    pub(crate) request: T::Request,
    pub(crate) respond_to: Response<T::Reply>,
}

/// Signals sent by entity actors back to their region.
#[derive(Debug)]
pub(crate) enum EntitySignal<T: ActorEntity> {
    /// The idle window elapsed; the actor asks to be removed from routing.
    Passivate { id: T::Id },
    /// The actor ran `on_stop` and exited.
    Terminated { id: T::Id },
}
