use super::{EntityId, MemberAddress, ShardId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    Stop,
}

/// An entity appeared at, or disappeared from, a placement.
///
/// Events raised by a local entity are `forwardable`; the copies sent to peers are not, so a
/// received copy is applied but never sent on again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    pub origin_member: MemberAddress,
    pub shard_id: ShardId,
    pub entity_id: EntityId,
    pub kind: EventKind,
    pub forwardable: bool,
}

impl LifecycleEvent {
    pub fn start(origin_member: MemberAddress, shard_id: ShardId, entity_id: EntityId) -> Self {
        Self {
            origin_member,
            shard_id,
            entity_id,
            kind: EventKind::Start,
            forwardable: true,
        }
    }

    pub fn stop(origin_member: MemberAddress, shard_id: ShardId, entity_id: EntityId) -> Self {
        Self {
            origin_member,
            shard_id,
            entity_id,
            kind: EventKind::Stop,
            forwardable: true,
        }
    }

    /// The copy sent to peers.
    pub fn as_forwarded(&self) -> Self {
        Self {
            forwardable: false,
            ..self.clone()
        }
    }
}
