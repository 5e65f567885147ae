//! # ActorClient Trait
//!
//! Provides a common interface for entity‑specific clients, adding default `ask`,
//! `passivate` and `active_entities` methods built on top of a generic `RegionClient`.
use crate::{ActorEntity, FrameworkError, RegionClient};
use async_trait::async_trait;

/// Trait for entity-specific clients to inherit the standard region operations.
///
/// A wrapper only supplies its inner [`RegionClient`] and an error mapping; the routing calls
/// come for free and are traced with the target id.
///
/// # Example
///
/// ```rust
/// use actor_framework::{ActorClient, ActorEntity, FrameworkError, RegionClient};
/// use async_trait::async_trait;
///
/// #[derive(Debug)] struct Session { hits: u32 }
/// #[derive(Debug)] struct SessionError(String);
///
/// impl std::fmt::Display for SessionError {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "{}", self.0)
///     }
/// }
/// impl std::error::Error for SessionError {}
/// impl From<String> for SessionError {
///     fn from(s: String) -> Self { SessionError(s) }
/// }
///
/// #[async_trait]
/// impl ActorEntity for Session {
///     type Id = u32; type Request = (); type Reply = u32;
///     type Context = (); type Error = SessionError;
///     fn new_instance(_: u32) -> Self { Self { hits: 0 } }
///     async fn handle(&mut self, _: (), _: &()) -> Result<u32, SessionError> {
///         self.hits += 1;
///         Ok(self.hits)
///     }
/// }
///
/// struct SessionClient {
///     inner: RegionClient<Session>,
/// }
///
/// impl ActorClient<Session> for SessionClient {
///     type Error = SessionError;
///
///     fn inner(&self) -> &RegionClient<Session> {
///         &self.inner
///     }
///
///     fn map_error(e: FrameworkError) -> Self::Error {
///         SessionError(e.to_string())
///     }
/// }
///
/// async fn usage(client: SessionClient) {
///     // ask() and passivate() are provided automatically!
///     let _ = client.ask(1, ()).await;
///     let _ = client.passivate(1).await;
/// }
/// ```
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The entity-specific error type.
    type Error: From<String> + Send + Sync;

    /// Access the inner generic RegionClient.
    fn inner(&self) -> &RegionClient<T>;

    /// Map framework errors to the specific entity error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Route a request to the entity `id`.
    #[tracing::instrument(skip(self, request))]
    async fn ask(&self, id: T::Id, request: T::Request) -> Result<T::Reply, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().ask(id, request).await.map_err(Self::map_error)
    }

    /// Evict the entity `id` now.
    #[tracing::instrument(skip(self))]
    async fn passivate(&self, id: T::Id) -> Result<bool, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().passivate(id).await.map_err(Self::map_error)
    }

    /// Ids with a live, non-passivating instance.
    async fn active_entities(&self) -> Result<Vec<T::Id>, Self::Error> {
        self.inner()
            .active_entities()
            .await
            .map_err(Self::map_error)
    }
}
