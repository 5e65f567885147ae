use super::ClusterMembership;
use crate::model::MemberAddress;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

/// Probes every peer's `/health` route on a fixed interval and records the outcome.
pub struct HeartbeatProber {
    membership: Arc<ClusterMembership>,
    client: reqwest::Client,
    interval: Duration,
}

impl HeartbeatProber {
    pub fn new(membership: Arc<ClusterMembership>, interval: Duration) -> Result<Self, reqwest::Error> {
        // A probe that outlives the interval counts as a miss.
        let client = reqwest::Client::builder().timeout(interval).build()?;
        Ok(Self {
            membership,
            client,
            interval,
        })
    }

    /// Probes until `shutdown` flips to true or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.interval, peers = self.membership.peers().len(), "Heartbeat started");

        loop {
            tokio::select! {
                _ = ticker.tick() => self.probe_all().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("Heartbeat stopped");
    }

    /// Probes every known peer once and records the outcome.
    pub async fn probe_all(&self) {
        for peer in self.membership.peers() {
            if self.probe(&peer).await {
                self.membership.mark_up(&peer);
            } else {
                self.membership.mark_unreachable(&peer);
            }
        }
    }

    async fn probe(&self, peer: &MemberAddress) -> bool {
        let url = format!("http://{peer}/health");
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(member = %peer, error = %e, "Probe failed");
                false
            }
        }
    }
}
