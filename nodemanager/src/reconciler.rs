//! Reverse-reference reconciliation.
//!
//! After a batch of nodes is committed, every edge they hold needs its
//! counterpart on the target. Targets in this graph get the counterpart
//! directly; targets owned elsewhere get it through the
//! [`ExternalReferences`] outbox. Outbox entries queued by earlier batches for
//! nodes that this batch just created are adopted into the graph.

use liha_model::{NodeId, ReferenceEdge};
use tracing::debug;

use crate::address_space::AddressSpace;
use crate::error::GraphError;
use crate::outbox::ExternalReferences;

/// What one reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Counterpart edges attached to nodes of this graph.
    pub local: usize,
    /// Counterpart edges queued for other node managers.
    pub external: usize,
    /// Previously queued edges now attached because their target arrived.
    pub adopted: usize,
}

/// Attaches or queues the counterpart of every edge held by `batch`.
///
/// Validation runs before anything is mutated: on error neither the graph
/// nor the outbox has changed.
///
/// # Errors
///
/// - [`GraphError::MissingTarget`] for an edge without a target.
/// - [`GraphError::DanglingReference`] for an edge into one of this graph's
///   namespaces whose target does not exist.
pub fn reconcile(
    space: &mut AddressSpace,
    batch: &[NodeId],
    outbox: &mut ExternalReferences,
) -> Result<ReconcileSummary, GraphError> {
    let mut local: Vec<(NodeId, ReferenceEdge)> = Vec::new();
    let mut external: Vec<(NodeId, ReferenceEdge)> = Vec::new();

    for source in batch {
        for edge in space.references(source) {
            if edge.target.is_null() {
                return Err(GraphError::MissingTarget {
                    source_node: source.clone(),
                    reference_type: edge.reference_type.clone(),
                });
            }
            let reverse = edge.reversed(source);
            if space.contains(&edge.target) {
                local.push((edge.target.clone(), reverse));
            } else if space.owns_namespace(edge.target.namespace_index) {
                return Err(GraphError::DanglingReference {
                    source_node: source.clone(),
                    target: edge.target.clone(),
                });
            } else {
                external.push((edge.target.clone(), reverse));
            }
        }
    }

    let mut summary = ReconcileSummary::default();
    for (target, edge) in local {
        if space.add_reference(&target, edge)? {
            summary.local += 1;
        }
    }
    for (target, edge) in external {
        debug!(target = %target, reference_type = %edge.reference_type, "queued external reference");
        if outbox.push(target, edge) {
            summary.external += 1;
        }
    }
    for (target, edges) in outbox.take_where(|id| space.contains(id)) {
        for edge in edges {
            if space.add_reference(&target, edge)? {
                summary.adopted += 1;
            }
        }
    }
    Ok(summary)
}
