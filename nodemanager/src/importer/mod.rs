//! The Definition Importer.
//!
//! A definition source is read into an [`ImportBatch`] that is fully
//! validated before the graph is touched. [`commit`] then inserts the batch
//! and reconciles its edges; if either step fails, the graph is restored from
//! a checkpoint taken before the first insertion.

mod nodeset;
mod xml;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use liha_model::{ids, NamespaceTable, NodeDescriptor, NodeId, ReferenceEdge};

use crate::address_space::AddressSpace;
use crate::error::{DefinitionError, DuplicateDefinitionError, GraphError, ImportError};
use crate::outbox::ExternalReferences;
use crate::reconciler::{reconcile, ReconcileSummary};

/// A named definition document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionSource {
    /// Name used in errors and logs, usually the file name.
    pub name: String,
    /// The NodeSet2 XML text.
    pub text: String,
}

impl DefinitionSource {
    /// Creates a source from in-memory text.
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Reads a source from disk; its name is the file name.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Io`] if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let text = fs::read_to_string(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { name, text })
    }
}

/// One node read from a source.
#[derive(Debug, Clone)]
pub struct ImportedNode {
    /// The node; its id is null when the source leaves it to the allocator.
    pub descriptor: NodeDescriptor,
    /// Edge to the parent, linked on insertion.
    pub parent: Option<ReferenceEdge>,
    /// All other edges declared by the node.
    pub references: Vec<ReferenceEdge>,
}

/// The buffered, validated content of one source.
#[derive(Debug, Clone)]
pub struct ImportBatch {
    /// Source name.
    pub source: String,
    /// Namespace URIs declared by the source, in local index order.
    pub namespace_uris: Vec<String>,
    /// Models the source defines.
    pub models: Vec<String>,
    /// Models that must have been imported before this source.
    pub required_models: Vec<String>,
    /// Nodes in document order.
    pub nodes: Vec<ImportedNode>,
}

impl ImportBatch {
    fn declared_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes
            .iter()
            .map(|n| &n.descriptor.node_id)
            .filter(|id| !id.is_null())
    }
}

/// What the importer resolves against.
#[derive(Debug, Clone, Copy)]
pub struct ImportContext<'a> {
    /// The server's namespace table; new URIs are appended to it.
    pub namespaces: &'a NamespaceTable,
    /// The graph the batch will be committed to.
    pub space: &'a AddressSpace,
    /// Model URIs already imported.
    pub loaded_models: &'a BTreeSet<String>,
}

/// Counts reported for a committed source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Nodes inserted.
    pub nodes: usize,
    /// Of those, nodes whose identifier was allocated.
    pub allocated: usize,
    /// Counterpart edges attached or queued.
    pub references: ReconcileSummary,
}

/// Reads and validates definition sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefinitionImporter;

impl DefinitionImporter {
    /// Parses `source` and checks it against `context` without touching the
    /// graph. Namespace URIs of the source are registered in the shared table
    /// even when a later check fails; the table is append-only.
    ///
    /// # Errors
    ///
    /// - [`ImportError::Definition`] if the source is malformed, declares a
    ///   node in the standard namespace, requires a model that is not
    ///   loaded, or uses a type that cannot be resolved.
    /// - [`ImportError::Duplicate`] if a node id repeats within the source or
    ///   already exists in the graph.
    pub fn read(
        &self,
        source: &DefinitionSource,
        context: &ImportContext<'_>,
    ) -> Result<ImportBatch, ImportError> {
        let batch = nodeset::read_batch(source, context.namespaces)?;
        check_namespaces(&batch)?;
        check_required_models(&batch, context)?;
        check_types(&batch, context)?;
        check_duplicates(&batch, context)?;
        Ok(batch)
    }
}

fn check_namespaces(batch: &ImportBatch) -> Result<(), DefinitionError> {
    match batch.declared_ids().find(|id| id.namespace_index == 0) {
        Some(id) => Err(DefinitionError::StandardNamespaceNode {
            source_name: batch.source.clone(),
            node: id.clone(),
        }),
        None => Ok(()),
    }
}

fn check_required_models(batch: &ImportBatch, context: &ImportContext<'_>) -> Result<(), DefinitionError> {
    for model in &batch.required_models {
        if model != ids::STANDARD_NAMESPACE_URI && !context.loaded_models.contains(model) {
            return Err(DefinitionError::MissingRequiredModel {
                source_name: batch.source.clone(),
                model: model.clone(),
            });
        }
    }
    Ok(())
}

/// Type definitions and supertypes must already exist: in the batch, in the
/// graph, or in the standard namespace served by the host.
fn check_types(batch: &ImportBatch, context: &ImportContext<'_>) -> Result<(), DefinitionError> {
    let in_batch: BTreeSet<&NodeId> = batch.declared_ids().collect();
    for node in &batch.nodes {
        let edges = node.parent.iter().chain(node.references.iter());
        for edge in edges {
            let names_type = (!edge.is_inverse && edge.reference_type == ids::HAS_TYPE_DEFINITION)
                || (edge.is_inverse && edge.reference_type == ids::HAS_SUBTYPE);
            if !names_type {
                continue;
            }
            let target = &edge.target;
            let resolved = target.namespace_index == 0
                || in_batch.contains(target)
                || context.space.contains(target);
            if !resolved {
                return Err(DefinitionError::UnresolvedType {
                    source_name: batch.source.clone(),
                    node: node.descriptor.node_id.clone(),
                    target: target.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_duplicates(
    batch: &ImportBatch,
    context: &ImportContext<'_>,
) -> Result<(), DuplicateDefinitionError> {
    let mut seen = BTreeSet::new();
    for id in batch.declared_ids() {
        if !seen.insert(id) || context.space.contains(id) {
            return Err(DuplicateDefinitionError {
                source_name: batch.source.clone(),
                node_id: id.clone(),
            });
        }
    }
    Ok(())
}

/// Inserts `batch` into `space` and reconciles its edges.
///
/// On success the reverse edges for foreign targets are added to `outbox`.
/// On failure the nodes of the batch are removed, every earlier node gets
/// back the edges it held before, and `outbox` is left untouched.
///
/// # Errors
///
/// Returns the [`GraphError`] that stopped insertion or reconciliation.
pub fn commit(
    space: &mut AddressSpace,
    batch: ImportBatch,
    outbox: &mut ExternalReferences,
) -> Result<ImportSummary, GraphError> {
    let mut added = Vec::with_capacity(batch.nodes.len());
    let saved = space.checkpoint();
    let mut pending = outbox.clone();
    match insert(space, batch.nodes, &mut added, &mut pending) {
        Ok(summary) => {
            *outbox = pending;
            Ok(summary)
        }
        Err(error) => {
            space.restore(saved);
            Err(error)
        }
    }
}

fn insert(
    space: &mut AddressSpace,
    nodes: Vec<ImportedNode>,
    added: &mut Vec<NodeId>,
    outbox: &mut ExternalReferences,
) -> Result<ImportSummary, GraphError> {
    let mut summary = ImportSummary::default();
    for node in nodes {
        if node.descriptor.node_id.is_null() {
            summary.allocated += 1;
        }
        let id = space.add(node.descriptor, node.parent)?;
        added.push(id.clone());
        for edge in node.references {
            space.add_reference(&id, edge)?;
        }
    }
    summary.nodes = added.len();
    summary.references = reconcile(space, added.as_slice(), outbox)?;
    Ok(summary)
}
