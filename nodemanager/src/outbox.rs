//! Reverse references destined for nodes owned by other node managers.

use std::collections::BTreeMap;

use liha_model::{NodeId, ReferenceEdge};

/// Pending reverse edges, keyed by the node they must be attached to.
///
/// The host runtime consumes the outbox once every node manager has finished
/// construction and hands each entry to the manager owning the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalReferences {
    entries: BTreeMap<NodeId, Vec<ReferenceEdge>>,
}

impl ExternalReferences {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `edge` for `target`. Returns false if the identical edge is
    /// already queued.
    pub fn push(&mut self, target: NodeId, edge: ReferenceEdge) -> bool {
        let pending = self.entries.entry(target).or_default();
        if pending.contains(&edge) {
            return false;
        }
        pending.push(edge);
        true
    }

    /// Edges queued for `target`.
    #[must_use]
    pub fn get(&self, target: &NodeId) -> &[ReferenceEdge] {
        self.entries.get(target).map_or(&[], Vec::as_slice)
    }

    /// Returns true if `edge` is queued for `target`.
    #[must_use]
    pub fn contains(&self, target: &NodeId, edge: &ReferenceEdge) -> bool {
        self.get(target).contains(edge)
    }

    /// Number of target nodes with pending edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of pending edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Iterates over `(target, edges)` in target order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &[ReferenceEdge])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Removes and returns every entry whose target satisfies `owned`.
    pub fn take_where(&mut self, owned: impl Fn(&NodeId) -> bool) -> Vec<(NodeId, Vec<ReferenceEdge>)> {
        let keys: Vec<NodeId> = self.entries.keys().filter(|k| owned(k)).cloned().collect();
        keys.into_iter()
            .filter_map(|k| self.entries.remove(&k).map(|edges| (k, edges)))
            .collect()
    }

    /// Removes and returns all entries, leaving the outbox empty.
    pub fn drain(&mut self) -> BTreeMap<NodeId, Vec<ReferenceEdge>> {
        std::mem::take(&mut self.entries)
    }
}
