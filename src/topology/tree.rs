//! # Topology Tree
//!
//! An in-memory labeled tree with exactly four levels. Nodes are addressed by their
//! `(name, kind)` pair; names only have to be unique among siblings of the same kind.
//!
//! The tree has no locking of its own. It is owned and mutated by the
//! [`TopologyAggregator`](crate::aggregator::TopologyAggregator) alone; readers only ever see
//! immutable snapshots of it.
//!
//! ## Placement rules
//!
//! * An entity id appears at most once in the whole tree. [`TopologyTree::add`] first evicts
//!   every existing node for the id, wherever it is, so the most recently applied start wins.
//! * Under [`PrunePolicy::PruneEmpty`] a shard left empty by a removal is removed, and then a
//!   member left empty by that. Under [`PrunePolicy::Retain`] both stay. The policy applies to
//!   explicit removals and to the placement vacated by a relocation alike.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Cluster,
    Member,
    Shard,
    Entity,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NodeKind::Cluster => "cluster",
            NodeKind::Member => "member",
            NodeKind::Shard => "shard",
            NodeKind::Entity => "entity",
        };
        f.write_str(label)
    }
}

/// One node of the tree. Entity nodes always have an empty `children` list.
///
/// Children are reference counted so a snapshot of the tree shares every subtree that a
/// later mutation does not touch; writers copy only the nodes on the path they change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub children: Vec<Arc<TopologyNode>>,
}

impl TopologyNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    fn matches(&self, name: &str, kind: NodeKind) -> bool {
        self.kind == kind && self.name == name
    }

    fn position(&self, name: &str, kind: NodeKind) -> Option<usize> {
        self.children.iter().position(|c| c.matches(name, kind))
    }

    /// Direct child with this `(name, kind)`.
    pub fn child(&self, name: &str, kind: NodeKind) -> Option<&TopologyNode> {
        self.children
            .iter()
            .find(|c| c.matches(name, kind))
            .map(|c| &**c)
    }

    fn child_or_insert(&mut self, name: &str, kind: NodeKind) -> &mut TopologyNode {
        let index = match self.position(name, kind) {
            Some(index) => index,
            None => {
                self.children.push(Arc::new(TopologyNode::new(name, kind)));
                self.children.len() - 1
            }
        };
        Arc::make_mut(&mut self.children[index])
    }

    /// Depth-first, pre-order search starting at (and including) this node.
    pub fn find(&self, name: &str, kind: NodeKind) -> Option<&TopologyNode> {
        if self.matches(name, kind) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name, kind))
    }

    fn detach(&mut self, name: &str, kind: NodeKind) -> Option<TopologyNode> {
        if let Some(index) = self.position(name, kind) {
            return Some(Arc::unwrap_or_clone(self.children.remove(index)));
        }
        // Only the branch holding the match is copied.
        let index = self
            .children
            .iter()
            .position(|c| c.find(name, kind).is_some())?;
        Arc::make_mut(&mut self.children[index]).detach(name, kind)
    }

    fn count(&self, kind: NodeKind) -> usize {
        let own = usize::from(self.kind == kind);
        own + self.children.iter().map(|c| c.count(kind)).sum::<usize>()
    }
}

/// What happens to shard and member nodes emptied by an entity removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrunePolicy {
    /// Keep emptied shard and member nodes.
    Retain,
    /// Remove an emptied shard, then an emptied member.
    #[default]
    PruneEmpty,
}

impl FromStr for PrunePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prune" | "prune-empty" => Ok(PrunePolicy::PruneEmpty),
            "retain" => Ok(PrunePolicy::Retain),
            other => Err(format!(
                "unknown prune policy '{other}', expected 'prune' or 'retain'"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyTree {
    root: TopologyNode,
    prune: PrunePolicy,
}

impl TopologyTree {
    pub fn new(cluster: impl Into<String>, prune: PrunePolicy) -> Self {
        Self {
            root: TopologyNode::new(cluster, NodeKind::Cluster),
            prune,
        }
    }

    pub fn root(&self) -> &TopologyNode {
        &self.root
    }

    pub fn prune_policy(&self) -> PrunePolicy {
        self.prune
    }

    /// Places `entity` under `member`/`shard`, evicting any earlier placement of the id first.
    /// Applying the same add twice leaves the tree unchanged.
    pub fn add(&mut self, member: &str, shard: &str, entity: &str) {
        if self.find_entity(member, shard, entity).is_some() {
            return;
        }
        self.evict_entity(entity);
        self.root
            .child_or_insert(member, NodeKind::Member)
            .child_or_insert(shard, NodeKind::Shard)
            .children
            .push(Arc::new(TopologyNode::new(entity, NodeKind::Entity)));
    }

    /// Removes `entity` from under `member`/`shard`. Returns whether a node was removed.
    pub fn remove(&mut self, member: &str, shard: &str, entity: &str) -> bool {
        let Some(m) = self.root.position(member, NodeKind::Member) else {
            return false;
        };
        let Some(s) = self.root.children[m].position(shard, NodeKind::Shard) else {
            return false;
        };
        let Some(e) = self.root.children[m].children[s].position(entity, NodeKind::Entity) else {
            return false;
        };

        let member_node = Arc::make_mut(&mut self.root.children[m]);
        let shard_node = Arc::make_mut(&mut member_node.children[s]);
        shard_node.children.remove(e);
        if self.prune == PrunePolicy::PruneEmpty && shard_node.children.is_empty() {
            member_node.children.remove(s);
            if member_node.children.is_empty() {
                self.root.children.remove(m);
            }
        }
        true
    }

    /// Removes every entity node named `entity`, pruning vacated placements per policy.
    fn evict_entity(&mut self, entity: &str) {
        while let Some((member, shard)) = self.placement_of(entity) {
            self.remove(&member, &shard, entity);
        }
    }

    fn placement_of(&self, entity: &str) -> Option<(String, String)> {
        self.root.children.iter().find_map(|member| {
            member
                .children
                .iter()
                .find(|shard| shard.child(entity, NodeKind::Entity).is_some())
                .map(|shard| (member.name.clone(), shard.name.clone()))
        })
    }

    /// First node matching `(name, kind)` in depth-first order.
    pub fn find(&self, name: &str, kind: NodeKind) -> Option<&TopologyNode> {
        self.root.find(name, kind)
    }

    pub fn find_entity(&self, member: &str, shard: &str, entity: &str) -> Option<&TopologyNode> {
        self.root
            .child(member, NodeKind::Member)?
            .child(shard, NodeKind::Shard)?
            .child(entity, NodeKind::Entity)
    }

    /// Detaches the first subtree matching `(name, kind)` below the root.
    pub fn remove_node(&mut self, name: &str, kind: NodeKind) -> Option<TopologyNode> {
        self.root.detach(name, kind)
    }

    pub fn entity_count(&self) -> usize {
        self.root.count(NodeKind::Entity)
    }

    /// Pretty JSON of the whole tree. Never fails; a serializer fault yields `{"error": ...}`.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.root)
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_paths(tree: &TopologyTree, entity: &str) -> Vec<(String, String)> {
        let mut paths = Vec::new();
        for member in &tree.root().children {
            for shard in &member.children {
                for e in &shard.children {
                    if e.name == entity {
                        paths.push((member.name.clone(), shard.name.clone()));
                    }
                }
            }
        }
        paths
    }

    /// members 1-4, three shards each, three entities per shard.
    fn sample_tree(prune: PrunePolicy) -> TopologyTree {
        let mut tree = TopologyTree::new("cluster", prune);
        let mut shard = 0;
        let mut entity = 0;
        for m in 1..=4 {
            for _ in 0..3 {
                shard += 1;
                for _ in 0..3 {
                    entity += 1;
                    tree.add(
                        &format!("member{m}"),
                        &format!("shard{shard:02}"),
                        &format!("entity{entity:02}"),
                    );
                }
            }
        }
        tree
    }

    #[test]
    fn test_scenario() {
        let mut tree = TopologyTree::new("cluster", PrunePolicy::default());

        tree.add("m1", "s1", "e1");
        assert!(tree.find("e1", NodeKind::Entity).is_some());

        let before = tree.clone();
        tree.add("m1", "s1", "e1");
        assert_eq!(tree, before);

        tree.add("m2", "s2", "e1");
        assert!(tree.find_entity("m1", "s1", "e1").is_none());
        assert!(tree.find_entity("m2", "s2", "e1").is_some());

        assert!(tree.remove("m2", "s2", "e1"));
        assert!(tree.find("e1", NodeKind::Entity).is_none());
    }

    #[test]
    fn test_add_is_idempotent() {
        for prune in [PrunePolicy::Retain, PrunePolicy::PruneEmpty] {
            let mut tree = sample_tree(prune);
            let before = tree.clone();
            tree.add("member2", "shard05", "entity14");
            tree.add("member2", "shard05", "entity14");
            assert_eq!(entity_paths(&tree, "entity14").len(), 1);
            assert_eq!(tree, before);
        }
    }

    #[test]
    fn test_add_relocates_entity() {
        let mut tree = sample_tree(PrunePolicy::Retain);
        assert_eq!(
            entity_paths(&tree, "entity01"),
            vec![("member1".to_string(), "shard01".to_string())]
        );

        tree.add("member4", "shard12", "entity01");
        assert_eq!(
            entity_paths(&tree, "entity01"),
            vec![("member4".to_string(), "shard12".to_string())]
        );
        assert_eq!(tree.entity_count(), 36);
    }

    #[test]
    fn test_add_to_empty_tree_builds_path() {
        let mut tree = TopologyTree::new("cluster", PrunePolicy::Retain);
        tree.add("member1", "shard01", "entity01");

        let member = tree.find("member1", NodeKind::Member).unwrap();
        assert_eq!(member.children.len(), 1);
        assert_eq!(member.children[0].name, "shard01");
        assert_eq!(member.children[0].children[0].name, "entity01");
        assert!(member.children[0].children[0].children.is_empty());
    }

    #[test]
    fn test_remove_last_entity_prunes_shard_and_member() {
        let mut tree = TopologyTree::new("cluster", PrunePolicy::PruneEmpty);
        tree.add("m1", "s1", "e1");
        tree.add("m1", "s2", "e2");

        assert!(tree.remove("m1", "s1", "e1"));
        assert!(tree.find("s1", NodeKind::Shard).is_none());
        assert!(tree.find("m1", NodeKind::Member).is_some());

        assert!(tree.remove("m1", "s2", "e2"));
        assert!(tree.find("m1", NodeKind::Member).is_none());
        assert!(tree.root().children.is_empty());
    }

    #[test]
    fn test_remove_last_entity_retains_shard_and_member() {
        let mut tree = TopologyTree::new("cluster", PrunePolicy::Retain);
        tree.add("m1", "s1", "e1");

        assert!(tree.remove("m1", "s1", "e1"));
        let shard = tree.find("s1", NodeKind::Shard).unwrap();
        assert!(shard.children.is_empty());
        assert!(tree.find("m1", NodeKind::Member).is_some());
    }

    #[test]
    fn test_relocation_applies_prune_policy_to_vacated_placement() {
        let mut pruned = TopologyTree::new("cluster", PrunePolicy::PruneEmpty);
        pruned.add("m1", "s1", "e1");
        pruned.add("m2", "s2", "e1");
        assert!(pruned.find("m1", NodeKind::Member).is_none());

        let mut retained = TopologyTree::new("cluster", PrunePolicy::Retain);
        retained.add("m1", "s1", "e1");
        retained.add("m2", "s2", "e1");
        assert!(retained.find("s1", NodeKind::Shard).is_some());
    }

    #[test]
    fn test_remove_wrong_path_is_noop() {
        let mut tree = sample_tree(PrunePolicy::PruneEmpty);
        assert!(!tree.remove("member1", "shard02", "entity01"));
        assert!(!tree.remove("member9", "shard01", "entity01"));
        assert!(!tree.remove("member1", "shard01", "entity99"));
        assert_eq!(tree.entity_count(), 36);
    }

    #[test]
    fn test_remove_node_detaches_subtrees() {
        let mut tree = sample_tree(PrunePolicy::Retain);

        let shard = tree.remove_node("shard05", NodeKind::Shard).unwrap();
        assert_eq!(shard.children.len(), 3);
        assert!(tree.find("entity14", NodeKind::Entity).is_none());

        let member = tree.remove_node("member3", NodeKind::Member).unwrap();
        assert_eq!(member.children.len(), 3);
        assert_eq!(tree.entity_count(), 36 - 3 - 9);

        assert!(tree.remove_node("cluster", NodeKind::Cluster).is_none());
        assert!(tree.remove_node("member3", NodeKind::Member).is_none());
    }

    #[test]
    fn test_names_are_unique_per_kind_only() {
        let mut tree = TopologyTree::new("cluster", PrunePolicy::Retain);
        tree.add("x", "x", "x");
        assert_eq!(tree.find("x", NodeKind::Member).unwrap().kind, NodeKind::Member);
        assert_eq!(tree.find("x", NodeKind::Shard).unwrap().kind, NodeKind::Shard);
        assert_eq!(tree.find("x", NodeKind::Entity).unwrap().kind, NodeKind::Entity);
    }

    #[test]
    fn test_json_shape_round_trips() {
        let tree = sample_tree(PrunePolicy::PruneEmpty);
        let json = tree.to_json();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "cluster");
        assert_eq!(value["type"], "cluster");
        assert_eq!(value["children"][0]["type"], "member");
        assert_eq!(value["children"][0]["children"][0]["children"][0]["type"], "entity");
        assert_eq!(
            value["children"][0]["children"][0]["children"][0]["children"],
            serde_json::json!([])
        );

        let parsed: TopologyNode = serde_json::from_str(&json).unwrap();
        assert_eq!(&parsed, tree.root());
    }

    #[test]
    fn test_snapshot_shares_untouched_members() {
        let mut tree = sample_tree(PrunePolicy::PruneEmpty);
        let snapshot = tree.clone();

        tree.add("member4", "shard12", "entity99");
        assert!(tree.remove("member3", "shard07", "entity19"));

        let before = &snapshot.root().children;
        let after = &tree.root().children;
        assert!(Arc::ptr_eq(&before[0], &after[0]));
        assert!(Arc::ptr_eq(&before[1], &after[1]));
        assert!(!Arc::ptr_eq(&before[2], &after[2]));
        assert!(!Arc::ptr_eq(&before[3], &after[3]));

        // The snapshot itself is unchanged.
        assert_eq!(snapshot, sample_tree(PrunePolicy::PruneEmpty));
        assert!(snapshot.find("entity99", NodeKind::Entity).is_none());
        assert!(snapshot.find_entity("member3", "shard07", "entity19").is_some());
    }

    #[test]
    fn test_prune_policy_parses() {
        assert_eq!("prune".parse::<PrunePolicy>().unwrap(), PrunePolicy::PruneEmpty);
        assert_eq!("Retain".parse::<PrunePolicy>().unwrap(), PrunePolicy::Retain);
        assert!("sometimes".parse::<PrunePolicy>().is_err());
    }
}
