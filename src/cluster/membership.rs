use crate::model::MemberAddress;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use tracing::{info, warn};

/// Current membership, consulted on every fan-out.
pub trait Membership: Send + Sync {
    fn self_address(&self) -> MemberAddress;

    /// Members currently believed to be up, including this one.
    fn up_members(&self) -> Vec<MemberAddress>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Up,
    Unreachable,
}

/// Member table seeded from configuration and kept current by the heartbeat prober.
///
/// Seeds start out `Up` so early events are offered to every configured peer; the first
/// failed probe marks a peer unreachable.
pub struct ClusterMembership {
    self_address: MemberAddress,
    members: RwLock<BTreeMap<MemberAddress, MemberStatus>>,
}

impl ClusterMembership {
    pub fn new(self_address: MemberAddress, seeds: impl IntoIterator<Item = MemberAddress>) -> Self {
        let mut members: BTreeMap<_, _> = seeds
            .into_iter()
            .map(|member| (member, MemberStatus::Up))
            .collect();
        members.insert(self_address.clone(), MemberStatus::Up);
        Self {
            self_address,
            members: RwLock::new(members),
        }
    }

    pub fn status(&self, member: &MemberAddress) -> Option<MemberStatus> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(member)
            .copied()
    }

    /// Every known member other than this one, whatever its status.
    pub fn peers(&self) -> Vec<MemberAddress> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|member| **member != self.self_address)
            .cloned()
            .collect()
    }

    pub fn mark_up(&self, member: &MemberAddress) {
        if self.transition(member, MemberStatus::Up) {
            info!(member = %member, "Member up");
        }
    }

    pub fn mark_unreachable(&self, member: &MemberAddress) {
        if self.transition(member, MemberStatus::Unreachable) {
            warn!(member = %member, "Member unreachable");
        }
    }

    /// Records `status`; returns whether it changed.
    fn transition(&self, member: &MemberAddress, status: MemberStatus) -> bool {
        let mut members = self.members.write().unwrap_or_else(PoisonError::into_inner);
        members.insert(member.clone(), status) != Some(status)
    }
}

impl Membership for ClusterMembership {
    fn self_address(&self) -> MemberAddress {
        self.self_address.clone()
    }

    fn up_members(&self) -> Vec<MemberAddress> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, status)| **status == MemberStatus::Up)
            .map(|(member, _)| member.clone())
            .collect()
    }
}
