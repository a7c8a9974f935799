//! Error types of the node manager.
//!
//! Construction errors ([`DefinitionError`], [`DuplicateDefinitionError`],
//! [`GraphError`]) abort the current import and, during activation, the whole
//! activation. [`ServiceError`] is reported per request to the calling client.

use std::path::PathBuf;

use liha_model::{NodeId, ParseNodeIdError};
use thiserror::Error;

/// A definition source is malformed or refers to something that does not
/// exist yet.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The XML itself could not be read.
    #[error("{source_name}: XML error at byte {position}: {message}")]
    Xml {
        /// Name of the definition source.
        source_name: String,
        /// Byte offset reported by the reader.
        position: usize,
        /// Reader message.
        message: String,
    },
    /// The document is well-formed XML but not a usable node set.
    #[error("{source_name}: {reason}")]
    Malformed {
        /// Name of the definition source.
        source_name: String,
        /// What is wrong.
        reason: String,
    },
    /// A node id, browse name or alias target has invalid syntax.
    #[error("{source_name}: {error}")]
    InvalidNodeId {
        /// Name of the definition source.
        source_name: String,
        /// The parse failure.
        #[source]
        error: ParseNodeIdError,
    },
    /// A node id uses a namespace index the source does not declare.
    #[error("{source_name}: namespace index {index} in '{text}' is not declared by the source")]
    UndeclaredNamespace {
        /// Name of the definition source.
        source_name: String,
        /// The offending local index.
        index: u16,
        /// The text it appeared in.
        text: String,
    },
    /// A type definition or supertype is neither in the source, nor already
    /// imported, nor a standard node.
    #[error("{source_name}: node {node} refers to unresolved type {target}")]
    UnresolvedType {
        /// Name of the definition source.
        source_name: String,
        /// The referring node.
        node: NodeId,
        /// The missing type.
        target: NodeId,
    },
    /// A node is declared in the standard namespace, which the host serves.
    #[error("{source_name}: node {node} is in the standard namespace")]
    StandardNamespaceNode {
        /// Name of the definition source.
        source_name: String,
        /// The offending node.
        node: NodeId,
    },
    /// A model the source requires has not been imported.
    #[error("{source_name}: required model '{model}' has not been imported")]
    MissingRequiredModel {
        /// Name of the definition source.
        source_name: String,
        /// URI of the missing model.
        model: String,
    },
    /// A value does not parse as its declared type.
    #[error("{source_name}: invalid value on {node}: {reason}")]
    InvalidValue {
        /// Name of the definition source.
        source_name: String,
        /// The node holding the value.
        node: String,
        /// What is wrong.
        reason: String,
    },
}

/// A node of a definition source already exists.
#[derive(Debug, Error)]
#[error("{source_name}: node {node_id} is already defined")]
pub struct DuplicateDefinitionError {
    /// Name of the definition source.
    pub source_name: String,
    /// The duplicated identifier.
    pub node_id: NodeId,
}

/// An invariant of the address-space graph would be violated.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A node with this identifier is already in the graph.
    #[error("identifier collision on {0}")]
    IdentifierCollision(NodeId),
    /// The node is not in the graph.
    #[error("node {0} is not in the address space")]
    NodeNotFound(NodeId),
    /// An edge has no target identifier.
    #[error("reference of type {reference_type} on {source_node} has no target")]
    MissingTarget {
        /// Holder of the malformed edge.
        source_node: NodeId,
        /// Its reference type.
        reference_type: NodeId,
    },
    /// An edge targets a node in one of this manager's namespaces that does
    /// not exist.
    #[error("reference on {source_node} targets missing node {target}")]
    DanglingReference {
        /// Holder of the edge.
        source_node: NodeId,
        /// The missing target.
        target: NodeId,
    },
    /// The identifier allocator ran out of numeric identifiers.
    #[error("identifier space of namespace {0} is exhausted")]
    AllocatorExhausted(u16),
}

/// A behavior factory could not build the specialized node. The generic node
/// is kept.
#[derive(Debug, Error)]
#[error("behavior factory failed: {0}")]
pub struct BehaviorError(pub String);

/// Failure to import one definition source. The graph is left unchanged.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The source could not be read.
    #[error("cannot read definition source {path}")]
    Io {
        /// Path of the source.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The source is malformed or unresolvable.
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    /// The source redefines an existing node.
    #[error(transparent)]
    Duplicate(#[from] DuplicateDefinitionError),
    /// Committing the source would break a graph invariant.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// The address space was already published.
    #[error("the address space is already active")]
    AlreadyActive,
}

/// Failure to activate the node manager. No address space is published.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// `create_address_space` was called on an active manager.
    #[error("the address space is already active")]
    AlreadyActive,
    /// A definition source failed to import.
    #[error("activation aborted by definition source '{source_name}'")]
    Import {
        /// Name of the failing source.
        source_name: String,
        /// Why it failed.
        #[source]
        error: ImportError,
    },
    /// The behavior substitution pass failed.
    #[error("behavior substitution failed")]
    Substitution(#[source] GraphError),
}

/// The configuration block could not be parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document is invalid.
    #[error("invalid application configuration")]
    Document(#[source] toml::de::Error),
    /// An extension does not match its schema.
    #[error("invalid configuration extension '{name}'")]
    Extension {
        /// Extension name.
        name: String,
        /// Deserialization failure.
        #[source]
        source: toml::de::Error,
    },
    /// A value could not be stored as an extension.
    #[error("cannot store configuration extension '{name}'")]
    Store {
        /// Extension name.
        name: String,
        /// Serialization failure.
        #[source]
        source: toml::ser::Error,
    },
}

/// A node manager could not be constructed.
#[derive(Debug, Error)]
pub enum CreateError {
    /// The configuration extension is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// No namespace index is left for one of the manager's URIs.
    #[error("namespace table is full, cannot register '{0}'")]
    NamespaceTableFull(String),
}

/// Per-request failures of browse, read and write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The node does not exist in this node manager.
    #[error("BadNodeIdUnknown: {0}")]
    BadNodeIdUnknown(NodeId),
    /// The node class has no such attribute.
    #[error("BadAttributeIdInvalid")]
    BadAttributeIdInvalid,
    /// The attribute is not writable.
    #[error("BadNotWritable")]
    BadNotWritable,
    /// The value does not match the declared data type.
    #[error("BadTypeMismatch")]
    BadTypeMismatch,
    /// The node manager has not finished activation.
    #[error("BadNotReady")]
    BadNotReady,
}
