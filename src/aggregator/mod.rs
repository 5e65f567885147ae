//! # Topology Aggregator
//!
//! The single writer of this member's [`TopologyTree`]. Lifecycle events from local entities
//! and from peers arrive on one channel and are applied strictly in arrival order. After every
//! event a fresh immutable snapshot is published, so readers never wait on the writer.
//!
//! First-hand events are then fanned out to every other member that is currently up, as
//! non-forwardable copies. Fan-out is fire-and-forget: a peer that cannot be reached just
//! misses the update.

mod client;
mod view;

pub use client::{AggregatorClient, AggregatorClosed, AggregatorRequest};
pub use view::TopologyView;

use crate::cluster::{EventTransport, Membership};
use crate::model::{EventKind, LifecycleEvent};
use crate::topology::{PrunePolicy, TopologyTree};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

pub struct TopologyAggregator {
    tree: TopologyTree,
    receiver: mpsc::UnboundedReceiver<AggregatorRequest>,
    snapshot: watch::Sender<Arc<TopologyTree>>,
    membership: Arc<dyn Membership>,
    transport: Arc<dyn EventTransport>,
}

impl TopologyAggregator {
    /// Creates the aggregator, the client feeding it and a view of its published snapshots.
    pub fn new(
        cluster: &str,
        prune: PrunePolicy,
        membership: Arc<dyn Membership>,
        transport: Arc<dyn EventTransport>,
    ) -> (Self, AggregatorClient, TopologyView) {
        let tree = TopologyTree::new(cluster, prune);
        let (snapshot, snapshot_rx) = watch::channel(Arc::new(tree.clone()));
        let (sender, receiver) = mpsc::unbounded_channel();
        let aggregator = Self {
            tree,
            receiver,
            snapshot,
            membership,
            transport,
        };
        (
            aggregator,
            AggregatorClient::new(sender),
            TopologyView::new(snapshot_rx),
        )
    }

    /// Applies events until `Shutdown` arrives or every client is dropped.
    pub async fn run(mut self) {
        info!(member = %self.membership.self_address(), prune = ?self.tree.prune_policy(), "Aggregator started");
        while let Some(request) = self.receiver.recv().await {
            match request {
                AggregatorRequest::Event(event) => self.apply(event),
                AggregatorRequest::Shutdown => break,
            }
        }
        info!(entities = self.tree.entity_count(), "Aggregator stopped");
    }

    fn apply(&mut self, event: LifecycleEvent) {
        let member = event.origin_member.as_str();
        let shard = event.shard_id.as_str();
        let entity = event.entity_id.as_str();
        match event.kind {
            EventKind::Start => self.tree.add(member, shard, entity),
            EventKind::Stop => {
                if !self.tree.remove(member, shard, entity) {
                    debug!(member, shard_id = shard, entity_id = entity, "Stop for unknown placement");
                }
            }
        }
        debug!(
            kind = ?event.kind,
            member,
            shard_id = shard,
            entity_id = entity,
            forwardable = event.forwardable,
            entities = self.tree.entity_count(),
            "Applied"
        );
        if event.forwardable {
            self.fan_out(&event);
        }
        // Shares every member subtree this event did not touch.
        self.snapshot.send_replace(Arc::new(self.tree.clone()));
    }

    /// Sends a non-forwardable copy to every up member except this one.
    fn fan_out(&self, event: &LifecycleEvent) {
        let own = self.membership.self_address();
        let forwarded = event.as_forwarded();
        for target in self.membership.up_members() {
            if target == own {
                continue;
            }
            if let Err(e) = self.transport.forward(&target, forwarded.clone()) {
                debug!(target = %target, error = %e, "Forward failed");
            }
        }
    }
}
