use actor_framework::setup_tracing;
use anyhow::Context;
use clap::Parser;
use cluster_topology::cluster::{ClusterMembership, HeartbeatProber, HttpTransport};
use cluster_topology::config::Config;
use cluster_topology::feed::{self, FeedState};
use cluster_topology::lifecycle::{TopologySystem, TrafficGenerator};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// How long shutdown waits for queued lifecycle events to reach the peers.
const FORWARD_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    setup_tracing();
    config.validate()?;

    let settings = config.settings();
    info!(member = %settings.member, peers = ?config.peers, "Starting cluster topology member");

    let membership = Arc::new(ClusterMembership::new(
        settings.member.clone(),
        config.peer_addresses(),
    ));
    let transport = Arc::new(
        HttpTransport::new(config.heartbeat_interval()).context("building event transport")?,
    );
    let system = TopologySystem::start(settings.clone(), membership.clone(), transport.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let heartbeat = HeartbeatProber::new(membership, config.heartbeat_interval())
        .context("building heartbeat client")?;
    let heartbeat_handle = tokio::spawn(heartbeat.run(shutdown_rx.clone()));

    let traffic_handle = config.traffic.then(|| {
        let generator = TrafficGenerator::new(system.entity_client.clone(), config.traffic_settings());
        tokio::spawn(generator.run(shutdown_rx.clone()))
    });

    let state = FeedState {
        view: system.view(),
        aggregator: system.aggregator.clone(),
        entities: system.entity_client.clone(),
        member: settings.member.clone(),
        push_interval: config.push_interval(),
        shutdown: shutdown_rx.clone(),
    };
    let mut server = tokio::spawn(feed::run_server(state, config.bind_addr(), shutdown_rx));

    // The server only finishes on its own if it failed to start.
    let finished = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("waiting for Ctrl-C")?;
            info!("Ctrl-C received");
            None
        }
        result = &mut server => Some(result),
    };

    let _ = shutdown_tx.send(true);
    let server_result = match finished {
        Some(result) => result,
        None => server.await,
    };
    match server_result {
        Ok(Err(e)) => error!(error = %e, "Feed server failed"),
        Err(e) => error!(error = %e, "Feed server task failed"),
        Ok(Ok(())) => {}
    }
    if let Some(handle) = traffic_handle {
        let _ = handle.await;
    }
    let _ = heartbeat_handle.await;

    system.shutdown().await?;
    // Stop events for every entity of this member are still queued for the peers.
    transport.close(FORWARD_GRACE).await;
    Ok(())
}
