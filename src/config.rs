//! Command-line and environment configuration.

use crate::lifecycle::{SystemSettings, TrafficSettings};
use crate::model::MemberAddress;
use crate::topology::PrunePolicy;
use actor_framework::RegionSettings;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("shard count must be at least 1")]
    ZeroShardCount,

    #[error("mailbox size must be at least 1")]
    ZeroMailboxSize,

    #[error("heartbeat interval must be at least 1 second")]
    ZeroHeartbeat,

    #[error("{0} must be at most {MAX_INTERVAL_SECS} seconds")]
    IntervalTooLong(&'static str),
}

/// Longest accepted interval or timeout: one day.
pub const MAX_INTERVAL_SECS: u64 = 86_400;

#[derive(Debug, Clone, Parser)]
#[command(name = "cluster-topology")]
#[command(about = "Tracks live entities across cluster members and streams the topology")]
pub struct Config {
    /// Name of the cluster root node
    #[arg(long, env = "TOPOLOGY_CLUSTER", default_value = "cluster")]
    pub cluster: String,

    /// Interface to bind the feed server to
    #[arg(long, env = "TOPOLOGY_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port of the feed server
    #[arg(short, long, env = "TOPOLOGY_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address peers reach this member at; defaults to 127.0.0.1:<port>
    #[arg(long, env = "TOPOLOGY_MEMBER")]
    pub member: Option<String>,

    /// Peer members, `host:port`, comma separated
    #[arg(long, env = "TOPOLOGY_PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Seconds without a message before an entity is passivated; 0 disables
    #[arg(long, env = "TOPOLOGY_IDLE_TIMEOUT", default_value_t = 60)]
    pub idle_timeout_secs: u64,

    /// Seconds between server-driven pushes to open sockets; 0 disables
    #[arg(long, env = "TOPOLOGY_PUSH_INTERVAL", default_value_t = 15)]
    pub push_interval_secs: u64,

    /// Number of shards entity ids are hashed into
    #[arg(long, env = "TOPOLOGY_SHARDS", default_value_t = 16)]
    pub shard_count: u32,

    /// What to do with shard and member nodes emptied by a stop: `prune` or `retain`
    #[arg(long, env = "TOPOLOGY_PRUNE", default_value = "prune")]
    pub prune: PrunePolicy,

    /// Seconds between peer health probes
    #[arg(long, env = "TOPOLOGY_HEARTBEAT", default_value_t = 5)]
    pub heartbeat_secs: u64,

    /// Per-entity mailbox capacity
    #[arg(long, env = "TOPOLOGY_MAILBOX", default_value_t = 32)]
    pub mailbox_size: usize,

    /// Generate random entity traffic on this member
    #[arg(long, env = "TOPOLOGY_TRAFFIC")]
    pub traffic: bool,

    /// Size of the entity id pool the traffic generator draws from
    #[arg(long, env = "TOPOLOGY_TRAFFIC_POOL", default_value_t = 100)]
    pub traffic_pool: u32,

    /// Milliseconds between generated commands
    #[arg(long, env = "TOPOLOGY_TRAFFIC_COMMAND_MS", default_value_t = 2000)]
    pub traffic_command_ms: u64,

    /// Milliseconds between generated queries
    #[arg(long, env = "TOPOLOGY_TRAFFIC_QUERY_MS", default_value_t = 2000)]
    pub traffic_query_ms: u64,
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shard_count == 0 {
            return Err(ConfigError::ZeroShardCount);
        }
        if self.mailbox_size == 0 {
            return Err(ConfigError::ZeroMailboxSize);
        }
        if self.heartbeat_secs == 0 {
            return Err(ConfigError::ZeroHeartbeat);
        }
        let intervals = [
            ("idle timeout", self.idle_timeout_secs),
            ("push interval", self.push_interval_secs),
            ("heartbeat interval", self.heartbeat_secs),
            ("traffic command interval", self.traffic_command_ms / 1000),
            ("traffic query interval", self.traffic_query_ms / 1000),
        ];
        for (name, secs) in intervals {
            if secs > MAX_INTERVAL_SECS {
                return Err(ConfigError::IntervalTooLong(name));
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn member_address(&self) -> MemberAddress {
        match &self.member {
            Some(member) => MemberAddress::new(member.trim()),
            None => MemberAddress::new(format!("127.0.0.1:{}", self.port)),
        }
    }

    pub fn peer_addresses(&self) -> Vec<MemberAddress> {
        self.peers
            .iter()
            .map(|peer| peer.trim())
            .filter(|peer| !peer.is_empty())
            .map(MemberAddress::new)
            .collect()
    }

    pub fn push_interval(&self) -> Option<Duration> {
        non_zero_secs(self.push_interval_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }

    pub fn settings(&self) -> SystemSettings {
        SystemSettings {
            cluster: self.cluster.clone(),
            member: self.member_address(),
            shard_count: self.shard_count,
            prune: self.prune,
            region: RegionSettings {
                mailbox_size: self.mailbox_size,
                idle_timeout: non_zero_secs(self.idle_timeout_secs),
                ..RegionSettings::default()
            },
        }
    }

    pub fn traffic_settings(&self) -> TrafficSettings {
        TrafficSettings {
            entity_pool: self.traffic_pool,
            command_interval: Duration::from_millis(self.traffic_command_ms.max(1)),
            query_interval: Duration::from_millis(self.traffic_query_ms.max(1)),
        }
    }
}
