//! # Shard Region
//!
//! The `ShardRegion` is the router in front of the entity actors. It maps each entity id to
//! at most one live [`EntityActor`](crate::actor), creates the actor when the first message
//! for an id arrives, and owns the two-phase eviction handshake.
//!
//! ## Slots
//!
//! Every known id sits in one of two slots:
//!
//! * **Active**: the region holds the only mailbox sender; routed messages go straight in.
//! * **Passivating**: the sender has been dropped and the old instance is draining. New
//!   messages for the id are buffered here and handed to a fresh instance once the old one
//!   reports `Terminated`, so its `on_stop` always runs before the next instance starts.
//!
//! ## Shutdown
//!
//! When every [`RegionClient`] is dropped the request channel closes. The region then drops
//! all mailbox senders, answers buffered messages with [`FrameworkError::ActorClosed`] and
//! waits until every actor has run `on_stop`.

use crate::actor::{entity_type, EntityActor};
use crate::client::RegionClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::{Delivery, EntitySignal, RegionRequest};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

/// Tuning knobs for a region.
#[derive(Debug, Clone)]
pub struct RegionSettings {
    /// Capacity of the region's request channel.
    pub buffer_size: usize,
    /// Capacity of each entity mailbox. A full mailbox answers `MailboxFull`.
    pub mailbox_size: usize,
    /// Idle window after which an entity asks to be passivated. `None` disables it.
    pub idle_timeout: Option<Duration>,
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            buffer_size: 32,
            mailbox_size: 32,
            idle_timeout: Some(Duration::from_secs(60)),
        }
    }
}

enum Slot<T: ActorEntity> {
    Active(mpsc::Sender<Delivery<T>>),
    Passivating(Vec<Delivery<T>>),
}

/// The router that hosts one actor per live entity id.
///
/// **Concurrency Model**:
/// The region itself processes its requests sequentially and never awaits an entity, so a
/// slow entity only ever delays messages for its own id. Entities for different ids run in
/// parallel in their own tasks.
pub struct ShardRegion<T: ActorEntity> {
    requests: mpsc::Receiver<RegionRequest<T>>,
    signals: mpsc::UnboundedReceiver<EntitySignal<T>>,
    signal_sender: mpsc::UnboundedSender<EntitySignal<T>>,
    slots: HashMap<T::Id, Slot<T>>,
    settings: RegionSettings,
}

impl<T: ActorEntity> ShardRegion<T> {
    /// Creates a new `ShardRegion` and its associated `RegionClient`.
    ///
    /// The region must be driven with [`ShardRegion::run`]; the client can be cloned and
    /// shared to route messages.
    pub fn new(settings: RegionSettings) -> (Self, RegionClient<T>) {
        let (sender, requests) = mpsc::channel(settings.buffer_size.max(1));
        let (signal_sender, signals) = mpsc::unbounded_channel();
        let region = Self {
            requests,
            signals,
            signal_sender,
            slots: HashMap::new(),
            settings,
        };
        (region, RegionClient::new(sender))
    }

    /// Runs the routing loop until every client is dropped, then stops all entities.
    ///
    /// # Context Injection
    /// `context` is shared by every entity instance this region creates and is handed to
    /// each `handle` and `on_stop` call.
    pub async fn run(mut self, context: T::Context) {
        let context = Arc::new(context);
        let entity_type = entity_type::<T>();
        info!(entity_type, idle_timeout = ?self.settings.idle_timeout, "Region started");

        loop {
            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(request) => self.handle_request(request, &context),
                    None => break,
                },
                Some(signal) = self.signals.recv() => self.handle_signal(signal, &context),
            }
        }

        info!(entity_type, live = self.slots.len(), "Region stopping");
        for slot in self.slots.values_mut() {
            if let Slot::Passivating(buffer) = slot {
                for delivery in buffer.drain(..) {
                    let _ = delivery.respond_to.send(Err(FrameworkError::ActorClosed));
                }
            }
            *slot = Slot::Passivating(Vec::new());
        }
        while !self.slots.is_empty() {
            match self.signals.recv().await {
                Some(EntitySignal::Terminated { id }) => {
                    self.slots.remove(&id);
                }
                Some(EntitySignal::Passivate { .. }) => {}
                None => break,
            }
        }
        info!(entity_type, "Shutdown");
    }

    fn handle_request(&mut self, request: RegionRequest<T>, context: &Arc<T::Context>) {
        match request {
            RegionRequest::Route {
                id,
                request,
                respond_to,
            } => self.route(id, Delivery { request, respond_to }, context),
            RegionRequest::Passivate { id, respond_to } => {
                let evicted = self.begin_passivation(&id);
                debug!(entity_type = entity_type::<T>(), %id, evicted, "Passivate requested");
                let _ = respond_to.send(Ok(evicted));
            }
            RegionRequest::ActiveEntities { respond_to } => {
                let ids = self
                    .slots
                    .iter()
                    .filter(|(_, slot)| matches!(slot, Slot::Active(_)))
                    .map(|(id, _)| id.clone())
                    .collect();
                let _ = respond_to.send(Ok(ids));
            }
        }
    }

    fn handle_signal(&mut self, signal: EntitySignal<T>, context: &Arc<T::Context>) {
        let entity_type = entity_type::<T>();
        match signal {
            EntitySignal::Passivate { id } => {
                if self.begin_passivation(&id) {
                    info!(entity_type, %id, "Passivating");
                }
            }
            EntitySignal::Terminated { id } => match self.slots.remove(&id) {
                Some(Slot::Passivating(buffer)) if !buffer.is_empty() => {
                    debug!(entity_type, %id, buffered = buffer.len(), "Redelivering to fresh instance");
                    let mailbox = self.spawn_entity(id.clone(), context, buffer.len());
                    for delivery in buffer {
                        Self::deliver(&id, &mailbox, delivery);
                    }
                    self.slots.insert(id, Slot::Active(mailbox));
                }
                Some(Slot::Active(_)) => {
                    warn!(entity_type, %id, "Entity terminated without passivation");
                }
                _ => debug!(entity_type, %id, "Terminated"),
            },
        }
    }

    fn route(&mut self, id: T::Id, delivery: Delivery<T>, context: &Arc<T::Context>) {
        match self.slots.get_mut(&id) {
            Some(Slot::Passivating(buffer)) => {
                debug!(entity_type = entity_type::<T>(), %id, "Buffering during passivation");
                buffer.push(delivery);
            }
            Some(Slot::Active(mailbox)) => match mailbox.try_send(delivery) {
                Ok(()) => {}
                Err(TrySendError::Full(delivery)) => {
                    warn!(entity_type = entity_type::<T>(), %id, "Mailbox full");
                    let _ = delivery
                        .respond_to
                        .send(Err(FrameworkError::MailboxFull(id.to_string())));
                }
                Err(TrySendError::Closed(delivery)) => {
                    // The instance is gone; its Terminated signal will restart it.
                    warn!(entity_type = entity_type::<T>(), %id, "Mailbox closed, buffering for restart");
                    self.slots.insert(id, Slot::Passivating(vec![delivery]));
                }
            },
            None => {
                let mailbox = self.spawn_entity(id.clone(), context, 0);
                Self::deliver(&id, &mailbox, delivery);
                self.slots.insert(id, Slot::Active(mailbox));
            }
        }
    }

    /// Drops the mailbox sender of an active id. Returns false if it was not active.
    fn begin_passivation(&mut self, id: &T::Id) -> bool {
        match self.slots.get_mut(id) {
            Some(slot @ Slot::Active(_)) => {
                *slot = Slot::Passivating(Vec::new());
                true
            }
            _ => false,
        }
    }

    fn spawn_entity(
        &self,
        id: T::Id,
        context: &Arc<T::Context>,
        backlog: usize,
    ) -> mpsc::Sender<Delivery<T>> {
        let capacity = self.settings.mailbox_size.max(backlog).max(1);
        let (sender, mailbox) = mpsc::channel(capacity);
        let actor = EntityActor::new(
            id,
            mailbox,
            self.signal_sender.clone(),
            self.settings.idle_timeout,
        );
        tokio::spawn(actor.run(Arc::clone(context)));
        sender
    }

    fn deliver(id: &T::Id, mailbox: &mpsc::Sender<Delivery<T>>, delivery: Delivery<T>) {
        if let Err(e) = mailbox.try_send(delivery) {
            let delivery = match e {
                TrySendError::Full(delivery) | TrySendError::Closed(delivery) => delivery,
            };
            let _ = delivery
                .respond_to
                .send(Err(FrameworkError::MailboxFull(id.to_string())));
        }
    }
}
