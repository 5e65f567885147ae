use super::{EntityId, ShardId};
use serde::{Deserialize, Serialize};

/// A tracked entity: its identity plus an opaque application value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub value: serde_json::Value,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, value: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

/// Creates the entity on first delivery, replaces its value afterwards.
#[derive(Debug, Clone)]
pub struct Command {
    pub entity: Entity,
}

#[derive(Debug, Clone)]
pub struct Query {
    pub id: EntityId,
}

#[derive(Debug)]
pub enum EntityRequest {
    Command(Command),
    Query(Query),
}

impl EntityRequest {
    /// The entity this request is addressed to, which is also its routing key.
    pub fn entity_id(&self) -> &EntityId {
        match self {
            EntityRequest::Command(command) => &command.entity.id,
            EntityRequest::Query(query) => &query.id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckKind {
    Initialize,
    Update,
}

/// Snapshot of an active entity as returned by a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityState {
    pub entity: Entity,
    pub shard_id: ShardId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityReply {
    CommandAck { kind: AckKind, entity: Entity },
    QueryAck(EntityState),
    QueryNotFound(EntityId),
}
