use crate::aggregator::AggregatorClient;
use crate::model::{LifecycleEvent, MemberAddress};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Unknown member: {0}")]
    UnknownMember(MemberAddress),

    #[error("Member {0} is not accepting events")]
    Unavailable(MemberAddress),

    #[error("No async runtime to send on")]
    NoRuntime,

    #[error("Transport closed")]
    Closed,
}

/// Delivers a lifecycle event to a peer's aggregator.
///
/// `forward` must not block: it hands the event off and returns. A returned error only means
/// the hand-off failed; delivery itself is never confirmed.
pub trait EventTransport: Send + Sync {
    fn forward(&self, target: &MemberAddress, event: LifecycleEvent) -> Result<(), TransportError>;
}

/// Posts events as JSON to `http://<member>/cluster/events`.
///
/// Each target gets its own queue, drained by one worker that posts sequentially, so a peer
/// receives this member's events in the order they were forwarded. A failed post is logged
/// and skipped; later events still go out in order.
pub struct HttpTransport {
    client: reqwest::Client,
    outbox: Mutex<Outbox>,
}

#[derive(Default)]
struct Outbox {
    queues: HashMap<MemberAddress, mpsc::UnboundedSender<LifecycleEvent>>,
    workers: Vec<JoinHandle<()>>,
    closed: bool,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            outbox: Mutex::new(Outbox::default()),
        })
    }

    /// Stops accepting events and waits up to `grace` for every queued one to be posted.
    /// Returns whether all queues drained in time.
    pub async fn close(&self, grace: Duration) -> bool {
        let workers = {
            let mut outbox = self.outbox.lock().unwrap_or_else(PoisonError::into_inner);
            outbox.closed = true;
            // Dropping the senders lets each worker finish once its queue is empty.
            outbox.queues.clear();
            std::mem::take(&mut outbox.workers)
        };
        let pending = workers.len();
        let drained = time::timeout(grace, async {
            for worker in workers {
                let _ = worker.await;
            }
        })
        .await
        .is_ok();
        if drained {
            debug!(queues = pending, "Event queues drained");
        } else {
            warn!(queues = pending, ?grace, "Event queues not drained in time");
        }
        drained
    }

    fn spawn_worker(
        &self,
        target: &MemberAddress,
        outbox: &mut Outbox,
    ) -> Result<mpsc::UnboundedSender<LifecycleEvent>, TransportError> {
        let runtime = Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
        let (sender, queue) = mpsc::unbounded_channel();
        outbox
            .workers
            .push(runtime.spawn(post_in_order(self.client.clone(), target.clone(), queue)));
        Ok(sender)
    }
}

async fn post_in_order(
    client: reqwest::Client,
    target: MemberAddress,
    mut queue: mpsc::UnboundedReceiver<LifecycleEvent>,
) {
    let url = format!("http://{target}/cluster/events");
    while let Some(event) = queue.recv().await {
        let outcome = client
            .post(&url)
            .json(&event)
            .send()
            .await
            .and_then(|response| response.error_for_status());
        if let Err(e) = outcome {
            debug!(target = %target, entity_id = %event.entity_id, error = %e, "Event not delivered");
        }
    }
}

impl EventTransport for HttpTransport {
    fn forward(&self, target: &MemberAddress, event: LifecycleEvent) -> Result<(), TransportError> {
        let mut outbox = self.outbox.lock().unwrap_or_else(PoisonError::into_inner);
        if outbox.closed {
            return Err(TransportError::Closed);
        }
        let live = outbox
            .queues
            .get(target)
            .filter(|queue| !queue.is_closed())
            .cloned();
        let queue = match live {
            Some(queue) => queue,
            None => {
                let queue = self.spawn_worker(target, &mut outbox)?;
                outbox.queues.insert(target.clone(), queue.clone());
                queue
            }
        };
        queue
            .send(event)
            .map_err(|_| TransportError::Unavailable(target.clone()))
    }
}

/// Routes events straight into registered in-process aggregators.
#[derive(Default)]
pub struct InMemoryTransport {
    nodes: RwLock<HashMap<MemberAddress, AggregatorClient>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, member: MemberAddress, aggregator: AggregatorClient) {
        self.nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(member, aggregator);
    }
}

impl EventTransport for InMemoryTransport {
    fn forward(&self, target: &MemberAddress, event: LifecycleEvent) -> Result<(), TransportError> {
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        let aggregator = nodes
            .get(target)
            .ok_or_else(|| TransportError::UnknownMember(target.clone()))?;
        aggregator
            .notify(event)
            .map_err(|_| TransportError::Unavailable(target.clone()))
    }
}
