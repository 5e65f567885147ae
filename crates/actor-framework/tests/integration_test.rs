use actor_framework::{ActorEntity, FrameworkError, RegionSettings, ShardRegion};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// --- Test Entity ---

/// Shared by every instance; records lifecycle steps so tests can assert on ordering.
#[derive(Default)]
struct Journal {
    lines: Mutex<Vec<String>>,
    entered: Notify,
    gate: Notify,
}

impl Journal {
    fn record(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[derive(Debug)]
struct Tally {
    id: String,
    total: i64,
    started: bool,
}

#[derive(Debug)]
enum TallyRequest {
    Add(i64),
    Read,
    /// Signals `entered`, then blocks until `gate` is notified.
    Hold,
}

#[derive(Debug, thiserror::Error)]
enum TallyError {
    #[error("negative amount {0}")]
    Negative(i64),
}

#[async_trait]
impl ActorEntity for Tally {
    type Id = String;
    type Request = TallyRequest;
    type Reply = i64;
    type Context = Arc<Journal>;
    type Error = TallyError;

    fn new_instance(id: String) -> Self {
        Self {
            id,
            total: 0,
            started: false,
        }
    }

    async fn handle(
        &mut self,
        request: TallyRequest,
        ctx: &Arc<Journal>,
    ) -> Result<i64, TallyError> {
        if !self.started {
            self.started = true;
            ctx.record(format!("start {}", self.id));
        }
        match request {
            TallyRequest::Add(n) if n < 0 => Err(TallyError::Negative(n)),
            TallyRequest::Add(n) => {
                self.total += n;
                Ok(self.total)
            }
            TallyRequest::Read => Ok(self.total),
            TallyRequest::Hold => {
                ctx.entered.notify_one();
                ctx.gate.notified().await;
                Ok(self.total)
            }
        }
    }

    async fn on_stop(&mut self, ctx: &Arc<Journal>) {
        ctx.record(format!("stop {} total={}", self.id, self.total));
    }
}

fn settings(mailbox_size: usize, idle: Option<Duration>) -> RegionSettings {
    RegionSettings {
        buffer_size: 16,
        mailbox_size,
        idle_timeout: idle,
    }
}

// --- Tests ---

#[tokio::test]
async fn test_routes_by_id_and_keeps_state() {
    let (region, client) = ShardRegion::<Tally>::new(settings(8, None));
    tokio::spawn(region.run(Arc::new(Journal::default())));

    assert_eq!(client.ask("a".into(), TallyRequest::Add(2)).await.unwrap(), 2);
    assert_eq!(client.ask("a".into(), TallyRequest::Add(3)).await.unwrap(), 5);
    assert_eq!(client.ask("b".into(), TallyRequest::Add(1)).await.unwrap(), 1);
    assert_eq!(client.ask("a".into(), TallyRequest::Read).await.unwrap(), 5);

    let mut active = client.active_entities().await.unwrap();
    active.sort();
    assert_eq!(active, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn test_entity_error_is_returned_to_caller() {
    let (region, client) = ShardRegion::<Tally>::new(settings(8, None));
    tokio::spawn(region.run(Arc::new(Journal::default())));

    let err = client
        .ask("a".into(), TallyRequest::Add(-4))
        .await
        .unwrap_err();
    match err {
        FrameworkError::EntityError(inner) => {
            let tally_err = inner.downcast_ref::<TallyError>().unwrap();
            assert!(matches!(tally_err, TallyError::Negative(-4)));
        }
        other => panic!("unexpected error {other:?}"),
    }

    // The entity survives its own error.
    assert_eq!(client.ask("a".into(), TallyRequest::Add(1)).await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_idle_entity_is_passivated_and_restarted_fresh() {
    let journal = Arc::new(Journal::default());
    let (region, client) =
        ShardRegion::<Tally>::new(settings(8, Some(Duration::from_secs(60))));
    tokio::spawn(region.run(journal.clone()));

    assert_eq!(client.ask("a".into(), TallyRequest::Add(7)).await.unwrap(), 7);

    // Activity inside the window keeps the entity alive.
    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(client.ask("a".into(), TallyRequest::Read).await.unwrap(), 7);
    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(client.active_entities().await.unwrap(), vec!["a".to_string()]);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(client.active_entities().await.unwrap().is_empty());

    // A new message starts a fresh instance with no memory of the old state.
    assert_eq!(client.ask("a".into(), TallyRequest::Read).await.unwrap(), 0);
    assert_eq!(
        journal.lines(),
        vec!["start a", "stop a total=7", "start a"]
    );
}

#[tokio::test]
async fn test_messages_during_passivation_reach_fresh_instance_after_stop() {
    let journal = Arc::new(Journal::default());
    let (region, client) = ShardRegion::<Tally>::new(settings(8, None));
    tokio::spawn(region.run(journal.clone()));

    assert_eq!(client.ask("a".into(), TallyRequest::Add(4)).await.unwrap(), 4);

    // Requests leave in poll order: Hold is queued, then the eviction, then Add is buffered.
    let (held, evicted, added, _) = tokio::join!(
        client.ask("a".into(), TallyRequest::Hold),
        client.passivate("a".into()),
        client.ask("a".into(), TallyRequest::Add(5)),
        async {
            client.active_entities().await.unwrap();
            journal.gate.notify_one();
        }
    );

    assert_eq!(held.unwrap(), 4);
    assert!(evicted.unwrap());
    assert_eq!(added.unwrap(), 5);
    assert_eq!(
        journal.lines(),
        vec!["start a", "stop a total=4", "start a"]
    );
}

#[tokio::test]
async fn test_passivate_unknown_entity_returns_false() {
    let (region, client) = ShardRegion::<Tally>::new(settings(8, None));
    tokio::spawn(region.run(Arc::new(Journal::default())));

    assert!(!client.passivate("ghost".into()).await.unwrap());
}

#[tokio::test]
async fn test_full_mailbox_is_rejected_explicitly() {
    let journal = Arc::new(Journal::default());
    let (region, client) = ShardRegion::<Tally>::new(settings(1, None));
    tokio::spawn(region.run(journal.clone()));

    let held = client.ask("a".into(), TallyRequest::Hold);
    let crowd = async {
        journal.entered.notified().await;
        let queued = client.ask("a".into(), TallyRequest::Add(1));
        let rejected = async {
            let result = client.ask("a".into(), TallyRequest::Add(2)).await;
            journal.gate.notify_one();
            result
        };
        tokio::join!(queued, rejected)
    };
    let (held, (queued, rejected)) = tokio::join!(held, crowd);

    assert_eq!(held.unwrap(), 0);
    assert_eq!(queued.unwrap(), 1);
    assert!(matches!(rejected, Err(FrameworkError::MailboxFull(id)) if id == "a"));
}

#[tokio::test]
async fn test_dropping_last_client_stops_every_entity() {
    let journal = Arc::new(Journal::default());
    let (region, client) = ShardRegion::<Tally>::new(settings(8, None));
    let handle = tokio::spawn(region.run(journal.clone()));

    client.ask("a".into(), TallyRequest::Add(1)).await.unwrap();
    client.ask("b".into(), TallyRequest::Add(2)).await.unwrap();

    drop(client);
    handle.await.unwrap();

    let mut stops: Vec<String> = journal
        .lines()
        .into_iter()
        .filter(|line| line.starts_with("stop"))
        .collect();
    stops.sort();
    assert_eq!(stops, vec!["stop a total=1", "stop b total=2"]);
}
