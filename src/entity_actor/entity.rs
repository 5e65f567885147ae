use super::EntityError;
use crate::aggregator::AggregatorClient;
use crate::model::{
    AckKind, Command, Entity, EntityId, EntityReply, EntityRequest, EntityState, LifecycleEvent,
    MemberAddress, Query, ShardId,
};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Dependencies shared by every tracked entity on this member.
pub struct EntityContext {
    pub member: MemberAddress,
    pub aggregator: AggregatorClient,
    pub shard_count: u32,
}

#[derive(Debug)]
enum Lifecycle {
    Uninitialized,
    Active { entity: Entity, shard_id: ShardId },
}

/// One live entity. Created empty by the region on first delivery; the first command
/// initializes it and announces its placement, teardown announces its departure.
#[derive(Debug)]
pub struct TrackedEntity {
    id: EntityId,
    lifecycle: Lifecycle,
}

impl TrackedEntity {
    fn command(&mut self, command: Command, ctx: &EntityContext) -> Result<EntityReply, EntityError> {
        match &mut self.lifecycle {
            Lifecycle::Active { entity, shard_id } => {
                debug!(entity_id = %self.id, shard_id = %shard_id, "Update");
                entity.value = command.entity.value;
                Ok(EntityReply::CommandAck {
                    kind: AckKind::Update,
                    entity: entity.clone(),
                })
            }
            Lifecycle::Uninitialized => {
                let shard_id = ShardId::from_routing_key(self.id.as_str(), ctx.shard_count)
                    .inspect_err(|e| warn!(entity_id = %self.id, error = %e, "Initialization failed"))?;
                let entity = Entity {
                    id: self.id.clone(),
                    value: command.entity.value,
                };

                info!(entity_id = %self.id, shard_id = %shard_id, member = %ctx.member, "Initialize");
                let event =
                    LifecycleEvent::start(ctx.member.clone(), shard_id.clone(), self.id.clone());
                if let Err(e) = ctx.aggregator.notify(event) {
                    debug!(entity_id = %self.id, error = %e, "Start event not delivered");
                }

                self.lifecycle = Lifecycle::Active {
                    entity: entity.clone(),
                    shard_id,
                };
                Ok(EntityReply::CommandAck {
                    kind: AckKind::Initialize,
                    entity,
                })
            }
        }
    }

    fn query(&self, query: Query) -> EntityReply {
        match &self.lifecycle {
            Lifecycle::Active { entity, shard_id } => EntityReply::QueryAck(EntityState {
                entity: entity.clone(),
                shard_id: shard_id.clone(),
            }),
            Lifecycle::Uninitialized => EntityReply::QueryNotFound(query.id),
        }
    }
}

#[async_trait]
impl ActorEntity for TrackedEntity {
    type Id = EntityId;
    type Request = EntityRequest;
    type Reply = EntityReply;
    type Context = EntityContext;
    type Error = EntityError;

    fn new_instance(id: EntityId) -> Self {
        Self {
            id,
            lifecycle: Lifecycle::Uninitialized,
        }
    }

    async fn handle(
        &mut self,
        request: EntityRequest,
        ctx: &EntityContext,
    ) -> Result<EntityReply, EntityError> {
        match request {
            EntityRequest::Command(command) => self.command(command, ctx),
            EntityRequest::Query(query) => Ok(self.query(query)),
        }
    }

    async fn on_stop(&mut self, ctx: &EntityContext) {
        // Never-initialized entities announced nothing, so they retract nothing.
        let Lifecycle::Active { shard_id, .. } = &self.lifecycle else {
            debug!(entity_id = %self.id, "Stopped before initialization");
            return;
        };
        info!(entity_id = %self.id, shard_id = %shard_id, "Stop");
        let event = LifecycleEvent::stop(ctx.member.clone(), shard_id.clone(), self.id.clone());
        if let Err(e) = ctx.aggregator.notify(event) {
            debug!(entity_id = %self.id, error = %e, "Stop event not delivered");
        }
    }
}
