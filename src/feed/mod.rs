//! Live feed server: the HTTP and WebSocket surface of a member.
//!
//! Observers read the topology tree; peers post lifecycle events; operators can drive
//! entities by hand. The server holds no topology state of its own, only a
//! [`TopologyView`] onto the aggregator's published snapshots.

mod handlers;
mod socket;

use crate::aggregator::{AggregatorClient, TopologyView};
use crate::clients::EntityClient;
use crate::model::MemberAddress;
use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// Shared state for every route.
#[derive(Clone)]
pub struct FeedState {
    pub view: TopologyView,
    pub aggregator: AggregatorClient,
    pub entities: EntityClient,
    pub member: MemberAddress,
    /// Server-driven push period for open sockets; `None` disables it.
    pub push_interval: Option<Duration>,
    /// Flips to true when the process is shutting down; open sockets close on it.
    pub shutdown: watch::Receiver<bool>,
}

pub fn build_router(state: FeedState) -> Router {
    Router::new()
        // Visualization page
        .route("/", get(handlers::monitor_page))
        .route("/home", get(handlers::monitor_page))
        .route("/monitor", get(handlers::monitor_page))
        // Topology feed
        .route("/events", get(socket::events))
        .route("/topology", get(handlers::topology))
        // Cluster plumbing
        .route("/health", get(handlers::health))
        .route("/cluster/events", post(handlers::ingest_event))
        // Entity access
        .route(
            "/entities/{id}",
            post(handlers::send_command).get(handlers::query_entity),
        )
        .with_state(state)
}

/// Binds `addr` and serves until `shutdown` flips to true.
pub async fn run_server(
    state: FeedState,
    addr: SocketAddr,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding feed server to {addr}"))?;
    info!("Topology monitor available at http://{}/monitor", addr);
    if addr.ip().is_unspecified() {
        warn!("Feed server is exposed on all interfaces");
    }
    serve(listener, state, shutdown).await
}

/// Serves on an already bound listener until `shutdown` flips to true.
pub async fn serve(
    listener: TcpListener,
    state: FeedState,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let mut shutdown = shutdown;
            loop {
                if *shutdown.borrow() {
                    break;
                }
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
            info!("Feed server shutting down...");
        })
        .await
        .context("feed server error")?;
    Ok(())
}
