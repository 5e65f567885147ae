use crate::topology::TopologyTree;
use std::sync::Arc;
use tokio::sync::watch;

/// Read side of the aggregator: the latest published tree.
///
/// Reading clones an `Arc`; it never blocks the aggregator.
#[derive(Clone)]
pub struct TopologyView {
    receiver: watch::Receiver<Arc<TopologyTree>>,
}

impl TopologyView {
    pub fn new(receiver: watch::Receiver<Arc<TopologyTree>>) -> Self {
        Self { receiver }
    }

    pub fn snapshot(&self) -> Arc<TopologyTree> {
        self.receiver.borrow().clone()
    }

    pub fn to_json(&self) -> String {
        self.snapshot().to_json()
    }

    /// Waits for the first published tree that satisfies `predicate`, checking the current
    /// one first. Returns `None` if the aggregator stopped before that happened.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&TopologyTree) -> bool,
    ) -> Option<Arc<TopologyTree>> {
        self.receiver
            .wait_for(|tree| predicate(tree))
            .await
            .ok()
            .map(|tree| tree.clone())
    }
}
