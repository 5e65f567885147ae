//! Error types for the entity lifecycle actor.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EntityError {
    /// The routing key cannot be mapped to a shard. The entity stays uninitialized.
    #[error("Malformed routing key: '{0}'")]
    MalformedRoutingKey(String),

    /// The entity's mailbox is full; the request was not accepted.
    #[error("Mailbox full for entity {0}")]
    MailboxFull(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for EntityError {
    fn from(msg: String) -> Self {
        EntityError::ActorCommunicationError(msg)
    }
}
