use cluster_topology::aggregator::TopologyAggregator;
use cluster_topology::cluster::{ClusterMembership, EventTransport, TransportError};
use cluster_topology::model::{EntityId, LifecycleEvent, MemberAddress, ShardId};
use cluster_topology::topology::{NodeKind, PrunePolicy};
use std::sync::{Arc, Mutex};

/// Records every forward instead of delivering it.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(MemberAddress, LifecycleEvent)>>,
    fail: bool,
}

impl RecordingTransport {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<(MemberAddress, LifecycleEvent)> {
        self.sent.lock().unwrap().clone()
    }
}

impl EventTransport for RecordingTransport {
    fn forward(&self, target: &MemberAddress, event: LifecycleEvent) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push((target.clone(), event));
        if self.fail {
            return Err(TransportError::Unavailable(target.clone()));
        }
        Ok(())
    }
}

fn addr(name: &str) -> MemberAddress {
    MemberAddress::new(name)
}

fn start(member: &str, shard: &str, entity: &str) -> LifecycleEvent {
    LifecycleEvent::start(addr(member), ShardId::new(shard), EntityId::new(entity))
}

fn stop(member: &str, shard: &str, entity: &str) -> LifecycleEvent {
    LifecycleEvent::stop(addr(member), ShardId::new(shard), EntityId::new(entity))
}

fn three_members() -> Arc<ClusterMembership> {
    Arc::new(ClusterMembership::new(addr("a:1"), [addr("b:1"), addr("c:1")]))
}

#[tokio::test]
async fn test_local_start_is_applied_and_fanned_out() {
    let transport = Arc::new(RecordingTransport::default());
    let (aggregator, client, mut view) = TopologyAggregator::new(
        "cluster",
        PrunePolicy::PruneEmpty,
        three_members(),
        transport.clone(),
    );
    tokio::spawn(aggregator.run());

    client.notify(start("a:1", "3", "e1")).unwrap();
    let tree = view
        .wait_for(|tree| tree.entity_count() == 1)
        .await
        .unwrap();
    assert!(tree.find_entity("a:1", "3", "e1").is_some());

    let sent = transport.sent();
    let targets: Vec<_> = sent.iter().map(|(target, _)| target.clone()).collect();
    assert_eq!(targets, vec![addr("b:1"), addr("c:1")]);
    for (_, event) in sent {
        assert!(!event.forwardable);
        assert_eq!(event.entity_id, EntityId::new("e1"));
        assert_eq!(event.origin_member, addr("a:1"));
    }
}

#[tokio::test]
async fn test_forwarded_event_is_applied_but_not_forwarded_again() {
    let transport = Arc::new(RecordingTransport::default());
    let (aggregator, client, mut view) = TopologyAggregator::new(
        "cluster",
        PrunePolicy::PruneEmpty,
        three_members(),
        transport.clone(),
    );
    tokio::spawn(aggregator.run());

    client.notify(start("b:1", "0", "remote").as_forwarded()).unwrap();
    client.notify(start("a:1", "1", "local")).unwrap();
    let tree = view
        .wait_for(|tree| tree.entity_count() == 2)
        .await
        .unwrap();

    assert!(tree.find_entity("b:1", "0", "remote").is_some());
    let forwarded: Vec<_> = transport
        .sent()
        .into_iter()
        .map(|(_, event)| event.entity_id)
        .collect();
    assert_eq!(forwarded, vec![EntityId::new("local"), EntityId::new("local")]);
}

#[tokio::test]
async fn test_unreachable_members_are_skipped() {
    let membership = three_members();
    membership.mark_unreachable(&addr("c:1"));
    let transport = Arc::new(RecordingTransport::default());
    let (aggregator, client, mut view) = TopologyAggregator::new(
        "cluster",
        PrunePolicy::PruneEmpty,
        membership.clone(),
        transport.clone(),
    );
    tokio::spawn(aggregator.run());

    client.notify(start("a:1", "1", "e1")).unwrap();
    view.wait_for(|tree| tree.entity_count() == 1).await.unwrap();
    assert_eq!(transport.sent().len(), 1);
    assert_eq!(transport.sent()[0].0, addr("b:1"));

    // Back up: the next event reaches it again.
    membership.mark_up(&addr("c:1"));
    client.notify(start("a:1", "1", "e2")).unwrap();
    view.wait_for(|tree| tree.entity_count() == 2).await.unwrap();
    assert_eq!(transport.sent().len(), 3);
}

#[tokio::test]
async fn test_forward_failures_do_not_stop_the_aggregator() {
    let transport = Arc::new(RecordingTransport::failing());
    let (aggregator, client, mut view) = TopologyAggregator::new(
        "cluster",
        PrunePolicy::PruneEmpty,
        three_members(),
        transport.clone(),
    );
    tokio::spawn(aggregator.run());

    client.notify(start("a:1", "1", "e1")).unwrap();
    client.notify(start("a:1", "2", "e2")).unwrap();
    let tree = view
        .wait_for(|tree| tree.entity_count() == 2)
        .await
        .unwrap();
    assert!(tree.find_entity("a:1", "2", "e2").is_some());
    assert_eq!(transport.sent().len(), 4);
}

#[tokio::test]
async fn test_events_apply_in_arrival_order() {
    let (aggregator, client, view) = TopologyAggregator::new(
        "cluster",
        PrunePolicy::PruneEmpty,
        three_members(),
        Arc::new(RecordingTransport::default()),
    );
    let handle = tokio::spawn(aggregator.run());

    client.notify(start("b:1", "4", "e1").as_forwarded()).unwrap();
    client.notify(stop("b:1", "4", "e1").as_forwarded()).unwrap();
    // Relocation: the same id shows up on another member.
    client.notify(start("a:1", "4", "e2")).unwrap();
    client.notify(start("c:1", "4", "e2").as_forwarded()).unwrap();
    client.shutdown().unwrap();
    handle.await.unwrap();

    let tree = view.snapshot();
    assert_eq!(tree.entity_count(), 1);
    assert!(tree.find_entity("c:1", "4", "e2").is_some());
    assert!(tree.find("b:1", NodeKind::Member).is_none());
    assert!(tree.find("a:1", NodeKind::Member).is_none());
}

#[tokio::test]
async fn test_stop_for_unknown_placement_is_ignored() {
    let (aggregator, client, mut view) = TopologyAggregator::new(
        "cluster",
        PrunePolicy::Retain,
        three_members(),
        Arc::new(RecordingTransport::default()),
    );
    tokio::spawn(aggregator.run());

    client.notify(start("a:1", "1", "e1")).unwrap();
    client.notify(stop("a:1", "9", "e1").as_forwarded()).unwrap();
    client.notify(start("a:1", "1", "e2")).unwrap();
    let tree = view
        .wait_for(|tree| tree.entity_count() == 2)
        .await
        .unwrap();
    assert!(tree.find_entity("a:1", "1", "e1").is_some());
}

#[tokio::test]
async fn test_notify_after_shutdown_reports_closed() {
    let (aggregator, client, _view) = TopologyAggregator::new(
        "cluster",
        PrunePolicy::PruneEmpty,
        three_members(),
        Arc::new(RecordingTransport::default()),
    );
    client.shutdown().unwrap();
    aggregator.run().await;

    assert!(client.notify(start("a:1", "1", "e1")).is_err());
}
