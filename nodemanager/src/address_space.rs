//! The address-space graph owned by one node manager.
//!
//! Nodes are keyed by their [`NodeId`]; each node sits behind its own lock so
//! attribute writes after activation never serialize unrelated clients. The
//! adjacency lists are kept beside the nodes, one list of [`ReferenceEdge`]s
//! per node, and are only mutated during construction.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use liha_model::{
    ids, BrowseDirection, NodeClass, NodeDescriptor, NodeId, QualifiedName, ReferenceEdge,
};
use parking_lot::RwLock;

use crate::allocator::IdentifierAllocator;
use crate::error::GraphError;

/// Shared handle to one node; the lock guards its attributes.
pub type NodeHandle = Arc<RwLock<NodeDescriptor>>;

/// One result row of a browse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDescription {
    /// Type of the followed edge.
    pub reference_type: NodeId,
    /// Direction of the followed edge.
    pub is_forward: bool,
    /// The node at the other end.
    pub node_id: NodeId,
    /// Browse name of the target, if this manager owns it.
    pub browse_name: Option<QualifiedName>,
    /// Display name of the target, if this manager owns it.
    pub display_name: Option<String>,
    /// Class of the target, if this manager owns it.
    pub node_class: Option<NodeClass>,
    /// Type definition of the target, if any.
    pub type_definition: Option<NodeId>,
}

/// Browse filter on reference types.
#[derive(Debug, Clone, Default)]
pub struct ReferenceFilter {
    /// Only follow edges of this type; `None` follows all.
    pub reference_type: Option<NodeId>,
    /// Also follow standard subtypes of `reference_type`.
    pub include_subtypes: bool,
}

impl ReferenceFilter {
    /// Follows every edge.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Follows edges of exactly `reference_type`.
    #[must_use]
    pub fn exact(reference_type: NodeId) -> Self {
        Self {
            reference_type: Some(reference_type),
            include_subtypes: false,
        }
    }

    /// Follows edges of `reference_type` and its subtypes.
    #[must_use]
    pub fn with_subtypes(reference_type: NodeId) -> Self {
        Self {
            reference_type: Some(reference_type),
            include_subtypes: true,
        }
    }

    fn accepts(&self, reference_type: &NodeId) -> bool {
        match &self.reference_type {
            None => true,
            Some(wanted) if self.include_subtypes => ids::is_subtype_of(reference_type, wanted),
            Some(wanted) => wanted == reference_type,
        }
    }
}

/// The nodes and edges contributed by one node manager.
#[derive(Debug)]
pub struct AddressSpace {
    allocation_namespace: u16,
    allocator: IdentifierAllocator,
    owned_namespaces: BTreeSet<u16>,
    nodes: BTreeMap<NodeId, NodeHandle>,
    references: BTreeMap<NodeId, Vec<ReferenceEdge>>,
}

impl AddressSpace {
    /// Creates an empty graph that allocates missing identifiers in
    /// `allocation_namespace`.
    #[must_use]
    pub fn new(allocation_namespace: u16) -> Self {
        Self {
            allocation_namespace,
            allocator: IdentifierAllocator::new(),
            owned_namespaces: BTreeSet::from([allocation_namespace]),
            nodes: BTreeMap::new(),
            references: BTreeMap::new(),
        }
    }

    /// Namespace index used for allocated identifiers.
    #[must_use]
    pub fn allocation_namespace(&self) -> u16 {
        self.allocation_namespace
    }

    /// The allocator stamping nodes that arrive without an identifier.
    #[must_use]
    pub fn allocator(&self) -> &IdentifierAllocator {
        &self.allocator
    }

    /// Marks a namespace as served by this graph. Edges into an owned
    /// namespace must resolve locally.
    pub fn claim_namespace(&mut self, namespace_index: u16) {
        self.owned_namespaces.insert(namespace_index);
    }

    /// Returns true if this graph serves `namespace_index`.
    #[must_use]
    pub fn owns_namespace(&self, namespace_index: u16) -> bool {
        self.owned_namespaces.contains(&namespace_index)
    }

    /// The namespaces served by this graph.
    #[must_use]
    pub fn owned_namespaces(&self) -> &BTreeSet<u16> {
        &self.owned_namespaces
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if `node_id` is in the graph.
    #[must_use]
    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// The lock-guarded node, for attribute access.
    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&NodeHandle> {
        self.nodes.get(node_id)
    }

    /// Snapshot of a node.
    #[must_use]
    pub fn find(&self, node_id: &NodeId) -> Option<NodeDescriptor> {
        self.nodes.get(node_id).map(|node| node.read().clone())
    }

    /// All node identifiers in order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// All nodes in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &NodeHandle)> {
        self.nodes.iter()
    }

    /// Edges held by `node_id`.
    #[must_use]
    pub fn references(&self, node_id: &NodeId) -> &[ReferenceEdge] {
        self.references.get(node_id).map_or(&[], Vec::as_slice)
    }

    /// Total number of edges held by all nodes.
    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.references.values().map(Vec::len).sum()
    }

    /// Inserts `node`, allocating an identifier if it has none, and links
    /// the optional `parent` edge. The parent's counterpart edge is attached
    /// right away when the parent is already in the graph; otherwise the
    /// reconciler attaches or queues it.
    ///
    /// # Errors
    ///
    /// - [`GraphError::IdentifierCollision`] if the identifier is taken.
    /// - [`GraphError::MissingTarget`] if `parent` has a null target.
    /// - [`GraphError::AllocatorExhausted`] if no identifier can be issued.
    pub fn add(
        &mut self,
        mut node: NodeDescriptor,
        parent: Option<ReferenceEdge>,
    ) -> Result<NodeId, GraphError> {
        if node.node_id.is_null() {
            node.node_id = self.allocate()?;
        } else if self.nodes.contains_key(&node.node_id) {
            return Err(GraphError::IdentifierCollision(node.node_id));
        }
        if let Some(edge) = &parent {
            if edge.target.is_null() {
                return Err(GraphError::MissingTarget {
                    source_node: node.node_id,
                    reference_type: edge.reference_type.clone(),
                });
            }
        }

        let node_id = node.node_id.clone();
        self.owned_namespaces.insert(node_id.namespace_index);
        self.nodes
            .insert(node_id.clone(), Arc::new(RwLock::new(node)));
        self.references.insert(node_id.clone(), Vec::new());

        if let Some(edge) = parent {
            let reverse = edge.reversed(&node_id);
            if let Some(parent_edges) = self.references.get_mut(&edge.target) {
                push_unique(parent_edges, reverse);
            }
            self.push_edge(&node_id, edge);
        }
        Ok(node_id)
    }

    fn allocate(&self) -> Result<NodeId, GraphError> {
        loop {
            let candidate = self.allocator.next_node_id(self.allocation_namespace)?;
            if !self.nodes.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Adds `edge` to the list of `source`. Returns false if the identical
    /// edge was already present.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if `source` is not in the graph.
    pub fn add_reference(
        &mut self,
        source: &NodeId,
        edge: ReferenceEdge,
    ) -> Result<bool, GraphError> {
        match self.references.get_mut(source) {
            Some(edges) => Ok(push_unique(edges, edge)),
            None => Err(GraphError::NodeNotFound(source.clone())),
        }
    }

    fn push_edge(&mut self, source: &NodeId, edge: ReferenceEdge) {
        if let Some(edges) = self.references.get_mut(source) {
            push_unique(edges, edge);
        }
    }

    /// Swaps the node stored under `old` for `new`. The replacement takes
    /// over the old identifier, so every edge pointing to or from it is kept.
    /// Returns the replaced node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if `old` is not in the graph.
    pub fn replace_node(
        &mut self,
        old: &NodeId,
        mut new: NodeDescriptor,
    ) -> Result<NodeDescriptor, GraphError> {
        let slot = self
            .nodes
            .get(old)
            .ok_or_else(|| GraphError::NodeNotFound(old.clone()))?;
        new.node_id = old.clone();
        let mut guard = slot.write();
        Ok(std::mem::replace(&mut *guard, new))
    }

    /// Captures the edge lists and owned namespaces so a failed batch can be
    /// undone with [`AddressSpace::restore`].
    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            owned_namespaces: self.owned_namespaces.clone(),
            references: self.references.clone(),
        }
    }

    /// Returns the graph to `checkpoint`: nodes inserted since are dropped and
    /// every earlier node gets back exactly the edges it held. Identifiers
    /// issued in between stay consumed.
    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        let Checkpoint {
            owned_namespaces,
            references,
        } = checkpoint;
        self.nodes.retain(|id, _| references.contains_key(id));
        self.references = references;
        self.owned_namespaces = owned_namespaces;
    }

    /// Follows the edges of `node_id`. Returns `None` if the node is not in
    /// the graph.
    #[must_use]
    pub fn browse(
        &self,
        node_id: &NodeId,
        direction: BrowseDirection,
        filter: &ReferenceFilter,
    ) -> Option<Vec<ReferenceDescription>> {
        let edges = self.references.get(node_id)?;
        let results = edges
            .iter()
            .filter(|edge| direction.includes(edge.is_inverse))
            .filter(|edge| filter.accepts(&edge.reference_type))
            .map(|edge| self.describe(edge))
            .collect();
        Some(results)
    }

    fn describe(&self, edge: &ReferenceEdge) -> ReferenceDescription {
        let target = self.nodes.get(&edge.target).map(|node| node.read().clone());
        ReferenceDescription {
            reference_type: edge.reference_type.clone(),
            is_forward: !edge.is_inverse,
            node_id: edge.target.clone(),
            browse_name: target.as_ref().map(|n| n.browse_name.clone()),
            display_name: target.as_ref().map(|n| n.display_name.clone()),
            node_class: target.as_ref().map(|n| n.node_class),
            type_definition: target.and_then(|n| n.type_definition),
        }
    }

    /// Nodes with no inverse hierarchical edge to another node of this graph,
    /// i.e. the entry points a host links under its own folders.
    #[must_use]
    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.references
            .iter()
            .filter(|(_, edges)| {
                !edges
                    .iter()
                    .any(|e| e.is_parent_link() && self.nodes.contains_key(&e.target))
            })
            .map(|(id, _)| id.clone())
            .collect()
    }
}

/// Saved graph structure; see [`AddressSpace::checkpoint`].
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint {
    owned_namespaces: BTreeSet<u16>,
    references: BTreeMap<NodeId, Vec<ReferenceEdge>>,
}

fn push_unique(edges: &mut Vec<ReferenceEdge>, edge: ReferenceEdge) -> bool {
    if edges.contains(&edge) {
        return false;
    }
    edges.push(edge);
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use liha_model::{AttributeId, Variant};

    use super::*;

    fn object(id: NodeId, name: &str) -> NodeDescriptor {
        let mut node = NodeDescriptor::new(id.clone(), NodeClass::Object, QualifiedName::new(id.namespace_index, name));
        node.type_definition = Some(ids::BASE_OBJECT_TYPE);
        node
    }

    #[test]
    fn add_links_parent_and_reverse() {
        let mut space = AddressSpace::new(3);
        let folder = space.add(object(NodeId::numeric(3, 1), "Folder"), None).unwrap();
        let child = space
            .add(
                object(NodeId::numeric(3, 2), "Child"),
                Some(ReferenceEdge::inverse(ids::ORGANIZES, folder.clone())),
            )
            .unwrap();

        assert_eq!(
            space.references(&folder),
            &[ReferenceEdge::forward(ids::ORGANIZES, child.clone())]
        );
        assert_eq!(
            space.references(&child),
            &[ReferenceEdge::inverse(ids::ORGANIZES, folder)]
        );
    }

    #[test]
    fn add_rejects_collisions() {
        let mut space = AddressSpace::new(3);
        space.add(object(NodeId::numeric(3, 7), "A"), None).unwrap();
        let err = space.add(object(NodeId::numeric(3, 7), "B"), None);
        assert!(matches!(err, Err(GraphError::IdentifierCollision(_))));
        assert_eq!(space.len(), 1);
    }

    #[test]
    fn allocation_skips_declared_identifiers() {
        let mut space = AddressSpace::new(3);
        space.add(object(NodeId::numeric(3, 1), "Declared"), None).unwrap();
        let allocated = space.add(object(NodeId::null(), "Fresh"), None).unwrap();
        assert_eq!(allocated, NodeId::numeric(3, 2));
        assert_eq!(space.allocator().last_used(), 2);
        assert_eq!(space.find(&allocated).unwrap().node_id, allocated);
    }

    #[test]
    fn add_rejects_parent_edge_without_target() {
        let mut space = AddressSpace::new(3);
        let err = space.add(
            object(NodeId::numeric(3, 9), "Orphan"),
            Some(ReferenceEdge::inverse(ids::ORGANIZES, NodeId::null())),
        );
        assert!(matches!(err, Err(GraphError::MissingTarget { .. })));
        assert!(space.is_empty());
    }

    #[test]
    fn replace_preserves_edges() {
        let mut space = AddressSpace::new(3);
        let folder = space.add(object(NodeId::numeric(3, 1), "Folder"), None).unwrap();
        let child = space
            .add(
                object(NodeId::numeric(3, 2), "Child"),
                Some(ReferenceEdge::inverse(ids::ORGANIZES, folder.clone())),
            )
            .unwrap();
        let before = space
            .browse(&folder, BrowseDirection::Forward, &ReferenceFilter::all())
            .unwrap();

        let mut replacement = object(NodeId::numeric(3, 999), "Child");
        replacement.set_attribute(AttributeId::EventNotifier, Variant::Byte(1));
        let old = space.replace_node(&child, replacement).unwrap();
        assert_eq!(old.node_id, child);

        let after = space
            .browse(&folder, BrowseDirection::Forward, &ReferenceFilter::all())
            .unwrap();
        assert_eq!(before, after);
        assert_eq!(space.find(&child).unwrap().node_id, child);
        assert!(!space.contains(&NodeId::numeric(3, 999)));
        assert_eq!(
            space.references(&child),
            &[ReferenceEdge::inverse(ids::ORGANIZES, folder)]
        );
    }

    #[test]
    fn replace_absent_node_fails() {
        let mut space = AddressSpace::new(3);
        let err = space.replace_node(&NodeId::numeric(3, 1), object(NodeId::numeric(3, 1), "X"));
        assert!(matches!(err, Err(GraphError::NodeNotFound(_))));
    }

    #[test]
    fn restore_drops_new_nodes_and_keeps_old_edges() {
        let mut space = AddressSpace::new(3);
        let folder = space.add(object(NodeId::numeric(3, 1), "Folder"), None).unwrap();
        let pending = NodeId::numeric(4, 5);
        space
            .add_reference(&folder, ReferenceEdge::forward(ids::HAS_INTERFACE, pending.clone()))
            .unwrap();
        let saved = space.checkpoint();
        let folder_edges = space.references(&folder).to_vec();

        space.add(object(pending.clone(), "Late"), None).unwrap();
        space
            .add(
                object(NodeId::numeric(3, 2), "Child"),
                Some(ReferenceEdge::inverse(ids::ORGANIZES, folder.clone())),
            )
            .unwrap();
        assert!(space.owns_namespace(4));

        space.restore(saved);
        assert_eq!(space.len(), 1);
        assert!(!space.contains(&pending));
        assert_eq!(space.references(&folder), folder_edges.as_slice());
        assert!(!space.owns_namespace(4));
    }

    #[test]
    fn browse_filters_by_type_and_direction() {
        let mut space = AddressSpace::new(3);
        let device = space.add(object(NodeId::numeric(3, 1), "Device"), None).unwrap();
        space
            .add(
                object(NodeId::numeric(3, 2), "Unit"),
                Some(ReferenceEdge::inverse(ids::HAS_COMPONENT, device.clone())),
            )
            .unwrap();
        space
            .add_reference(&device, ReferenceEdge::forward(ids::HAS_TYPE_DEFINITION, ids::BASE_OBJECT_TYPE))
            .unwrap();

        let hierarchical = space
            .browse(
                &device,
                BrowseDirection::Forward,
                &ReferenceFilter::with_subtypes(ids::HIERARCHICAL_REFERENCES),
            )
            .unwrap();
        assert_eq!(hierarchical.len(), 1);
        assert_eq!(hierarchical[0].browse_name, Some(QualifiedName::new(3, "Unit")));
        assert_eq!(hierarchical[0].node_class, Some(NodeClass::Object));

        let inverse = space
            .browse(&device, BrowseDirection::Inverse, &ReferenceFilter::all())
            .unwrap();
        assert!(inverse.is_empty());

        let typed = space
            .browse(&device, BrowseDirection::Both, &ReferenceFilter::exact(ids::HAS_TYPE_DEFINITION))
            .unwrap();
        assert_eq!(typed.len(), 1);
        assert_eq!(typed[0].browse_name, None);

        assert!(space
            .browse(&NodeId::numeric(3, 42), BrowseDirection::Both, &ReferenceFilter::all())
            .is_none());
    }

    #[test]
    fn root_nodes_are_the_unparented_ones() {
        let mut space = AddressSpace::new(3);
        let folder = space.add(object(NodeId::numeric(3, 1), "Folder"), None).unwrap();
        space
            .add(
                object(NodeId::numeric(3, 2), "Child"),
                Some(ReferenceEdge::inverse(ids::ORGANIZES, folder.clone())),
            )
            .unwrap();
        assert_eq!(space.root_nodes(), vec![folder]);
    }
}
