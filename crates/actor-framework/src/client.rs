//! # Generic Client
//!
//! This module defines the generic client for routing messages through a `ShardRegion`.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::RegionRequest;
use tokio::sync::{mpsc, oneshot};

/// ## RegionClient
///
/// The `RegionClient<T>` provides a type‑safe, async API for talking to the entities hosted by
/// a `ShardRegion<T>`. Every call names the target id; the region creates the entity on first
/// delivery. Replies come back over oneshot channels.
///
/// * **Cloneable** – holds only a sender, so cloning is inexpensive.
/// * **Lifetime** – the region keeps running while at least one clone is alive; dropping the
///   last one shuts it down and stops every entity.
pub struct RegionClient<T: ActorEntity> {
    sender: mpsc::Sender<RegionRequest<T>>,
}

// Manual impl: a derive would require `T: Clone`.
impl<T: ActorEntity> Clone for RegionClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: ActorEntity> RegionClient<T> {
    pub fn new(sender: mpsc::Sender<RegionRequest<T>>) -> Self {
        Self { sender }
    }

    /// Deliver `request` to the entity `id` and wait for its reply.
    pub async fn ask(&self, id: T::Id, request: T::Request) -> Result<T::Reply, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(RegionRequest::Route {
                id,
                request,
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    /// Evict `id` without waiting for its idle window. Returns `false` if it was not active.
    pub async fn passivate(&self, id: T::Id) -> Result<bool, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(RegionRequest::Passivate { id, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn active_entities(&self) -> Result<Vec<T::Id>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(RegionRequest::ActiveEntities { respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }
}
