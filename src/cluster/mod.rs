//! Cluster collaborators: who is up, and how lifecycle events reach them.
//!
//! Both are traits so the aggregator can run against the HTTP implementations in a real
//! deployment and against in-process ones in tests.

pub mod heartbeat;
pub mod membership;
pub mod transport;

pub use heartbeat::HeartbeatProber;
pub use membership::{ClusterMembership, MemberStatus, Membership};
pub use transport::{EventTransport, HttpTransport, InMemoryTransport, TransportError};
