use crate::clients::EntityClient;
use crate::model::{Entity, EntityId, EntityReply};
use rand::Rng;
use serde_json::json;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct TrafficSettings {
    /// Ids are drawn from `entity-1..=entity-<pool>`.
    pub entity_pool: u32,
    pub command_interval: Duration,
    pub query_interval: Duration,
}

/// Synthetic load: random commands and queries over a fixed pool of entity ids, so a lone
/// member has something to show.
pub struct TrafficGenerator {
    client: EntityClient,
    settings: TrafficSettings,
}

impl TrafficGenerator {
    pub fn new(client: EntityClient, settings: TrafficSettings) -> Self {
        Self { client, settings }
    }

    fn pick_id(&self) -> EntityId {
        let n = rand::thread_rng().gen_range(1..=self.settings.entity_pool.max(1));
        EntityId::new(format!("entity-{n}"))
    }

    /// Runs until `shutdown` flips to true or its sender is dropped. Drops its client on exit.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut commands = time::interval(self.settings.command_interval);
        let mut queries = time::interval(self.settings.query_interval);
        commands.set_missed_tick_behavior(MissedTickBehavior::Skip);
        queries.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(pool = self.settings.entity_pool, "Traffic generator started");

        loop {
            tokio::select! {
                _ = commands.tick() => self.command().await,
                _ = queries.tick() => self.query().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Traffic generator stopped");
    }

    async fn command(&self) {
        let id = self.pick_id();
        let value = json!({ "counter": rand::thread_rng().gen_range(0..1000) });
        match self.client.send_command(Entity { id: id.clone(), value }).await {
            Ok(EntityReply::CommandAck { kind, .. }) => debug!(entity_id = %id, ?kind, "Command acknowledged"),
            Ok(other) => warn!(entity_id = %id, reply = ?other, "Unexpected command reply"),
            Err(e) => warn!(entity_id = %id, error = %e, "Command failed"),
        }
    }

    async fn query(&self) {
        let id = self.pick_id();
        match self.client.query(id.clone()).await {
            Ok(EntityReply::QueryAck(state)) => {
                debug!(entity_id = %id, shard_id = %state.shard_id, "Query found")
            }
            Ok(EntityReply::QueryNotFound(_)) => debug!(entity_id = %id, "Query not found"),
            Ok(other) => warn!(entity_id = %id, reply = ?other, "Unexpected query reply"),
            Err(e) => warn!(entity_id = %id, error = %e, "Query failed"),
        }
    }
}
