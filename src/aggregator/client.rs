use crate::model::LifecycleEvent;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum AggregatorRequest {
    Event(LifecycleEvent),
    Shutdown,
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Topology aggregator closed")]
pub struct AggregatorClosed;

/// Fire-and-forget handle to the aggregator. Sending never blocks or waits for the event to
/// be applied.
#[derive(Clone, Debug)]
pub struct AggregatorClient {
    sender: mpsc::UnboundedSender<AggregatorRequest>,
}

impl AggregatorClient {
    pub fn new(sender: mpsc::UnboundedSender<AggregatorRequest>) -> Self {
        Self { sender }
    }

    pub fn notify(&self, event: LifecycleEvent) -> Result<(), AggregatorClosed> {
        self.sender
            .send(AggregatorRequest::Event(event))
            .map_err(|_| AggregatorClosed)
    }

    /// Asks the aggregator to stop after the events already queued.
    pub fn shutdown(&self) -> Result<(), AggregatorClosed> {
        self.sender
            .send(AggregatorRequest::Shutdown)
            .map_err(|_| AggregatorClosed)
    }
}
