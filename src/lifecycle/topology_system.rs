use crate::aggregator::{AggregatorClient, TopologyAggregator, TopologyView};
use crate::clients::EntityClient;
use crate::cluster::{EventTransport, Membership};
use crate::entity_actor::{self, EntityContext};
use crate::model::MemberAddress;
use crate::topology::PrunePolicy;
use actor_framework::RegionSettings;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

/// Everything needed to start one member's topology system.
#[derive(Debug, Clone)]
pub struct SystemSettings {
    pub cluster: String,
    pub member: MemberAddress,
    pub shard_count: u32,
    pub prune: PrunePolicy,
    pub region: RegionSettings,
}

#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("{task} task failed: {source}")]
    TaskFailed {
        task: &'static str,
        #[source]
        source: JoinError,
    },
}

/// The running topology system of one member.
///
/// `TopologySystem` is responsible for:
/// - **Lifecycle Management**: starting the aggregator and the entity region, and stopping
///   them in an order that lets every entity's stop event reach the tree
/// - **Dependency Wiring**: the entity context needs the aggregator client, so the region is
///   created first and only run once the aggregator exists
///
/// # Example
///
/// ```ignore
/// let system = TopologySystem::start(settings, membership, transport);
/// system.entity_client.send_command(Entity::new("e1", json!(1))).await?;
/// let tree = system.view().snapshot();
/// system.shutdown().await?;
/// ```
pub struct TopologySystem {
    /// Client for routing commands and queries to entities
    pub entity_client: EntityClient,

    /// Ingress for lifecycle events, local or from peers
    pub aggregator: AggregatorClient,

    view: TopologyView,
    region_handle: JoinHandle<()>,
    aggregator_handle: JoinHandle<()>,
}

impl TopologySystem {
    /// Spawns the aggregator and the entity region.
    pub fn start(
        settings: SystemSettings,
        membership: Arc<dyn Membership>,
        transport: Arc<dyn EventTransport>,
    ) -> Self {
        // 1. The single writer of the topology tree
        let (aggregator, aggregator_client, view) = TopologyAggregator::new(
            &settings.cluster,
            settings.prune,
            membership,
            transport,
        );
        let aggregator_handle = tokio::spawn(aggregator.run());

        // 2. The entity region, with the aggregator injected as context
        let (region, entity_client) = entity_actor::new(settings.region.clone());
        let context = EntityContext {
            member: settings.member.clone(),
            aggregator: aggregator_client.clone(),
            shard_count: settings.shard_count,
        };
        let region_handle = tokio::spawn(region.run(context));

        info!(
            cluster = %settings.cluster,
            member = %settings.member,
            shards = settings.shard_count,
            "Topology system started"
        );

        Self {
            entity_client,
            aggregator: aggregator_client,
            view,
            region_handle,
            aggregator_handle,
        }
    }

    pub fn view(&self) -> TopologyView {
        self.view.clone()
    }

    /// Stops every entity, lets their stop events drain into the tree, then stops the
    /// aggregator.
    ///
    /// The region only stops once every clone of [`TopologySystem::entity_client`] is gone,
    /// so callers must drop the clones they handed out (feed server, traffic) first.
    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        warn!("Coordinated shutdown: passivating all entities");

        // Step 1: closing the region stops every entity; each initialized one emits Stop.
        drop(self.entity_client);
        self.region_handle.await.map_err(|source| {
            error!(error = %source, "Region task failed");
            ShutdownError::TaskFailed {
                task: "region",
                source,
            }
        })?;

        // Step 2: Shutdown is queued behind those Stop events.
        if self.aggregator.shutdown().is_err() {
            warn!("Aggregator already stopped");
        }
        self.aggregator_handle.await.map_err(|source| {
            error!(error = %source, "Aggregator task failed");
            ShutdownError::TaskFailed {
                task: "aggregator",
                source,
            }
        })?;

        info!("System shutdown complete.");
        Ok(())
    }
}
