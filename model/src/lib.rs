//! Address-space data model for the LiHa system node manager.
//!
//! The `liha-model` crate defines the vocabulary shared by the node manager,
//! its validators and the host runtime: namespace-scoped [`NodeId`]s, the
//! append-only [`NamespaceTable`], [`NodeDescriptor`]s with their typed
//! attributes, and the [`ReferenceEdge`]s that link them.
//!
//! # Example
//!
//! ```
//! use liha_model::{ids, NamespaceTable, NodeClass, NodeDescriptor, NodeId, QualifiedName};
//!
//! let table = NamespaceTable::shared();
//! let ns = table.get_index_or_append("http://example.org/UA/Pump").unwrap();
//!
//! let mut pump = NodeDescriptor::new(
//!     NodeId::numeric(ns, 5001),
//!     NodeClass::Object,
//!     QualifiedName::new(ns, "Pump"),
//! );
//! pump.type_definition = Some(ids::BASE_OBJECT_TYPE);
//! assert_eq!(pump.node_id.to_string(), "ns=1;i=5001");
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod ids;
pub mod namespace;
pub mod node;
pub mod node_id;
pub mod reference;
pub mod variant;

pub use namespace::{NamespaceTable, SharedNamespaceTable};
pub use node::{NodeBehavior, NodeClass, NodeDescriptor};
pub use node_id::{Identifier, NodeId, ParseNodeIdError, QualifiedName};
pub use reference::{BrowseDirection, ReferenceEdge};
pub use variant::{AttributeId, Variant, ACCESS_CURRENT_READ, ACCESS_CURRENT_WRITE};
