use crate::entity_actor::{EntityError, TrackedEntity};
use crate::model::{Command, Entity, EntityId, EntityReply, EntityRequest, Query};
use actor_framework::{ActorClient, FrameworkError, RegionClient};
use tracing::{debug, instrument};

/// Client for routing commands and queries to tracked entities.
#[derive(Clone)]
pub struct EntityClient {
    inner: RegionClient<TrackedEntity>,
}

impl EntityClient {
    pub fn new(inner: RegionClient<TrackedEntity>) -> Self {
        Self { inner }
    }

    /// Initializes the entity on first use, replaces its value afterwards.
    #[instrument(skip(self, entity), fields(entity_id = %entity.id))]
    pub async fn send_command(&self, entity: Entity) -> Result<EntityReply, EntityError> {
        debug!(value = %entity.value, "Sending command");
        self.route(EntityRequest::Command(Command { entity })).await
    }

    pub async fn query(&self, id: EntityId) -> Result<EntityReply, EntityError> {
        self.route(EntityRequest::Query(Query { id })).await
    }

    /// Sends `request` to the entity it names.
    async fn route(&self, request: EntityRequest) -> Result<EntityReply, EntityError> {
        let id = request.entity_id().clone();
        self.ask(id, request).await
    }
}

impl ActorClient<TrackedEntity> for EntityClient {
    type Error = EntityError;

    fn inner(&self) -> &RegionClient<TrackedEntity> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::MailboxFull(id) => EntityError::MailboxFull(id),
            FrameworkError::EntityError(inner) => match inner.downcast::<EntityError>() {
                Ok(entity_error) => *entity_error,
                Err(other) => EntityError::ActorCommunicationError(other.to_string()),
            },
            other => EntityError::ActorCommunicationError(other.to_string()),
        }
    }
}
