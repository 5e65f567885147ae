//! # Mock Framework & Testing Guide
//!
//! The `MockClient<T>` type hands out a real `RegionClient<T>` whose region is replaced by an
//! in‑memory expectation queue. It lets you script replies and inject failures for unit tests
//! of client wrappers without spawning a region or any entity.
//!
//! ## When to use Mocks vs a Real Region
//!
//! | Feature | MockClient | Real Region |
//! |---------|------------|-------------|
//! | **Speed** | Instant (in-memory) | Fast (but spawns one task per entity) |
//! | **Determinism** | 100% Deterministic | Subject to scheduler and idle timers |
//! | **State** | No real state (expectations) | Real entity state and lifecycle |
//! | **Use Case** | Testing logic *around* the client | Testing the entity or the full system |
//! | **Error Injection** | Easy (`return_err`) | Hard (requires a full mailbox, a dead actor...) |
//!
//! ## Example
//!
//! ```rust
//! use actor_framework::mock::MockClient;
//! use actor_framework::{ActorEntity, FrameworkError};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)] struct Counter { total: u64 }
//! #[derive(Debug, thiserror::Error)] #[error("Counter error")] struct CounterError;
//!
//! #[async_trait]
//! impl ActorEntity for Counter {
//!     type Id = String; type Request = u64; type Reply = u64;
//!     type Context = (); type Error = CounterError;
//!     fn new_instance(_: String) -> Self { Self { total: 0 } }
//!     async fn handle(&mut self, n: u64, _: &()) -> Result<u64, CounterError> {
//!         self.total += n;
//!         Ok(self.total)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockClient::<Counter>::new();
//!     mock.expect_ask("a".to_string()).return_ok(7);
//!     mock.expect_ask("b".to_string()).return_err(FrameworkError::MailboxFull("b".into()));
//!
//!     let client = mock.client();
//!     assert_eq!(client.ask("a".to_string(), 1).await.unwrap(), 7);
//!     assert!(matches!(
//!         client.ask("b".to_string(), 1).await,
//!         Err(FrameworkError::MailboxFull(_))
//!     ));
//!     mock.verify();
//! }
//! ```
//!
//! ## Mocking Utilities
//!
//! Use [`create_mock_client`] to get a client and a raw receiver, or use the fluent
//! [`MockClient`] API.

use crate::client::RegionClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::RegionRequest;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected request and the reply the mock answers it with.
enum Expectation<T: ActorEntity> {
    Ask {
        id: T::Id,
        response: Result<T::Reply, FrameworkError>,
    },
    Passivate {
        id: T::Id,
        response: Result<bool, FrameworkError>,
    },
    ActiveEntities {
        response: Result<Vec<T::Id>, FrameworkError>,
    },
}

type Expectations<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A mock client with expectation tracking for fluent testing.
///
/// Expectations are consumed in order. A request that does not match the next expectation
/// (wrong kind or wrong id) panics the mock's task, which the caller observes as
/// [`FrameworkError::ActorDropped`].
pub struct MockClient<T: ActorEntity> {
    client: RegionClient<T>,
    expectations: Expectations<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<RegionRequest<T>>(100);
        let expectations: Expectations<T> = Arc::new(Mutex::new(VecDeque::new()));
        let expectations_clone = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = expectations_clone.lock().unwrap().pop_front();

                match (request, expectation) {
                    (
                        RegionRequest::Route { id, respond_to, .. },
                        Some(Expectation::Ask {
                            id: expected,
                            response,
                        }),
                    ) => {
                        assert_eq!(id, expected, "ask routed to unexpected entity");
                        let _ = respond_to.send(response);
                    }
                    (
                        RegionRequest::Passivate { id, respond_to },
                        Some(Expectation::Passivate {
                            id: expected,
                            response,
                        }),
                    ) => {
                        assert_eq!(id, expected, "passivate for unexpected entity");
                        let _ = respond_to.send(response);
                    }
                    (
                        RegionRequest::ActiveEntities { respond_to },
                        Some(Expectation::ActiveEntities { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    _ => {
                        panic!("Unexpected request or expectation mismatch");
                    }
                }
            }
        });

        Self {
            client: RegionClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> RegionClient<T> {
        self.client.clone()
    }

    /// Expects an `ask` routed to `id`.
    pub fn expect_ask(&mut self, id: T::Id) -> AskExpectationBuilder<T> {
        AskExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `passivate` for `id`.
    pub fn expect_passivate(&mut self, id: T::Id) -> PassivateExpectationBuilder<T> {
        PassivateExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects an `active_entities` listing.
    pub fn expect_active_entities(&mut self) -> ActiveEntitiesExpectationBuilder<T> {
        ActiveEntitiesExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }
}

/// Builder for `ask` expectations.
pub struct AskExpectationBuilder<T: ActorEntity> {
    id: T::Id,
    expectations: Expectations<T>,
}

impl<T: ActorEntity> AskExpectationBuilder<T> {
    pub fn return_ok(self, reply: T::Reply) {
        self.push(Ok(reply));
    }

    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<T::Reply, FrameworkError>) {
        self.expectations.lock().unwrap().push_back(Expectation::Ask {
            id: self.id,
            response,
        });
    }
}

/// Builder for `passivate` expectations.
pub struct PassivateExpectationBuilder<T: ActorEntity> {
    id: T::Id,
    expectations: Expectations<T>,
}

impl<T: ActorEntity> PassivateExpectationBuilder<T> {
    pub fn return_ok(self, evicted: bool) {
        self.push(Ok(evicted));
    }

    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<bool, FrameworkError>) {
        self.expectations
            .lock()
            .unwrap()
            .push_back(Expectation::Passivate {
                id: self.id,
                response,
            });
    }
}

/// Builder for `active_entities` expectations.
pub struct ActiveEntitiesExpectationBuilder<T: ActorEntity> {
    expectations: Expectations<T>,
}

impl<T: ActorEntity> ActiveEntitiesExpectationBuilder<T> {
    pub fn return_ok(self, ids: Vec<T::Id>) {
        self.expectations
            .lock()
            .unwrap()
            .push_back(Expectation::ActiveEntities { response: Ok(ids) });
    }
}

// =============================================================================
// RAW RECEIVER HELPERS
// =============================================================================

/// Creates a client and the receiver its requests land on.
///
/// # Testing Strategy
/// When a test needs to hold a reply back (to observe what the caller does while waiting) or
/// inspect the request payload, drive the receiver by hand instead of scripting a
/// [`MockClient`].
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (RegionClient<T>, mpsc::Receiver<RegionRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (RegionClient::new(sender), receiver)
}

/// Helper to verify that the next message is a routed request.
pub async fn expect_route<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<RegionRequest<T>>,
) -> Option<(
    T::Id,
    T::Request,
    oneshot::Sender<Result<T::Reply, FrameworkError>>,
)> {
    match receiver.recv().await {
        Some(RegionRequest::Route {
            id,
            request,
            respond_to,
        }) => Some((id, request, respond_to)),
        _ => None,
    }
}
