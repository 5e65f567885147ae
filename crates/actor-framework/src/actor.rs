//! # Entity Actor
//!
//! One `EntityActor` runs per live entity id. It owns the entity instance and the receiving
//! end of its mailbox, processes deliveries strictly one at a time and watches an idle
//! window that is reset on every dequeued message.
//!
//! ## Passivation
//!
//! When the idle window elapses the actor does **not** stop itself. It moves to
//! [`Phase::Passivating`] and asks its region to evict it. The region removes the id from
//! routing and drops the last mailbox sender; the actor then drains whatever was already
//! queued, runs [`ActorEntity::on_stop`] and reports back. Nothing is ever routed to an
//! instance that has begun tearing down.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::{Delivery, EntitySignal};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info};

/// Where a running actor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Serving messages, idle timer armed.
    Active,
    /// Eviction requested; draining the mailbox until the region closes it.
    Passivating,
}

/// Short type name used as the `entity_type` field in logs
/// (e.g., "TrackedEntity" instead of "cluster_topology::entity_actor::entity::TrackedEntity").
pub(crate) fn entity_type<T>() -> &'static str {
    std::any::type_name::<T>()
        .split("::")
        .last()
        .unwrap_or("Unknown")
}

/// Reports `Terminated` to the region when the actor task ends, including by panic.
struct TerminationGuard<T: ActorEntity> {
    id: Option<T::Id>,
    region: mpsc::UnboundedSender<EntitySignal<T>>,
}

impl<T: ActorEntity> Drop for TerminationGuard<T> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            let _ = self.region.send(EntitySignal::Terminated { id });
        }
    }
}

pub(crate) struct EntityActor<T: ActorEntity> {
    id: T::Id,
    entity: T,
    mailbox: mpsc::Receiver<Delivery<T>>,
    region: mpsc::UnboundedSender<EntitySignal<T>>,
    idle_timeout: Option<Duration>,
    phase: Phase,
}

impl<T: ActorEntity> EntityActor<T> {
    pub(crate) fn new(
        id: T::Id,
        mailbox: mpsc::Receiver<Delivery<T>>,
        region: mpsc::UnboundedSender<EntitySignal<T>>,
        idle_timeout: Option<Duration>,
    ) -> Self {
        let entity = T::new_instance(id.clone());
        Self {
            id,
            entity,
            mailbox,
            region,
            idle_timeout,
            phase: Phase::Active,
        }
    }

    /// Runs the mailbox loop until the region closes the mailbox.
    pub(crate) async fn run(mut self, context: Arc<T::Context>) {
        let entity_type = entity_type::<T>();
        let _guard = TerminationGuard::<T> {
            id: Some(self.id.clone()),
            region: self.region.clone(),
        };
        debug!(entity_type, id = %self.id, "Entity actor started");

        while let Some(delivery) = self.next_delivery().await {
            debug!(entity_type, id = %self.id, request = ?delivery.request, "Deliver");
            let result = self
                .entity
                .handle(delivery.request, &context)
                .await
                .map_err(|e| FrameworkError::EntityError(Box::new(e)));
            if let Err(e) = &result {
                debug!(entity_type, id = %self.id, error = %e, "Request failed");
            }
            let _ = delivery.respond_to.send(result);
        }

        self.entity.on_stop(&context).await;
        debug!(entity_type, id = %self.id, phase = ?self.phase, "Entity actor stopped");
    }

    /// Next queued delivery, or `None` once the region has closed the mailbox.
    async fn next_delivery(&mut self) -> Option<Delivery<T>> {
        loop {
            let window = match (self.phase, self.idle_timeout) {
                (Phase::Active, Some(window)) => window,
                _ => return self.mailbox.recv().await,
            };

            match time::timeout(window, self.mailbox.recv()).await {
                Ok(next) => return next,
                Err(_) => {
                    info!(entity_type = entity_type::<T>(), id = %self.id, ?window, "Idle, requesting passivation");
                    self.phase = Phase::Passivating;
                    let _ = self.region.send(EntitySignal::Passivate {
                        id: self.id.clone(),
                    });
                }
            }
        }
    }
}
