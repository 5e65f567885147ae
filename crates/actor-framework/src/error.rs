//! Errors surfaced to callers of a region.
//!
//! Delivery failures (the region or the instance went away, the mailbox was full) are kept
//! apart from failures the entity itself reported, which travel boxed in
//! [`FrameworkError::EntityError`] and can be downcast back to the entity's own type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameworkError {
    /// The region has stopped; nothing can be routed any more.
    #[error("Region closed")]
    ActorClosed,

    /// The instance went away before replying.
    #[error("Entity dropped the reply channel")]
    ActorDropped,

    /// The entity's mailbox had no room; the request was not queued.
    #[error("Mailbox full for entity {0}")]
    MailboxFull(String),

    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
}
