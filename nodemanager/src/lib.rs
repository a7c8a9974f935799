//! Node manager for a LiHa liquid-handling system.
//!
//! `liha-nodemanager` builds the address space of one LiHa system from
//! NodeSet2 definition sources and serves it to a host server runtime:
//!
//! - [`importer`]: reads a source into a validated batch and commits it
//!   all-or-nothing.
//! - [`allocator`]: issues identifiers to nodes that arrive without one.
//! - [`address_space`]: the graph of nodes and edges, with per-node locks.
//! - [`reconciler`]: attaches or queues the counterpart of every edge.
//! - [`behavior`]: replaces generic objects by specialized ones.
//! - [`hooks`]: monitored-item lifecycle extension points.
//! - [`manager`]: [`LiHaSystemNodeManager`], tying the above together.
//!
//! # Example
//!
//! ```
//! use liha_model::{ids, AttributeId, NamespaceTable, NodeId, Variant};
//! use liha_nodemanager::{
//!     ApplicationConfiguration, DefinitionSource, ExternalReferences, LiHaSystemNodeManager,
//!     ServerContext,
//! };
//!
//! let server = ServerContext::new(NamespaceTable::shared());
//! let manager = LiHaSystemNodeManager::new(&server, &ApplicationConfiguration::default())?;
//!
//! let source = DefinitionSource::new(
//!     "lihasystem.xml",
//!     r#"<UANodeSet>
//!          <NamespaceUris><Uri>http://liha.org/UA/LiHaSystem</Uri></NamespaceUris>
//!          <UAObject NodeId="ns=1;i=5001" BrowseName="1:LiHa">
//!            <References><Reference ReferenceType="Organizes" IsForward="false">i=85</Reference></References>
//!          </UAObject>
//!        </UANodeSet>"#,
//! );
//! let mut outbox = ExternalReferences::new();
//! manager.create_address_space_from(&[source], &mut outbox)?;
//!
//! let liha = NodeId::numeric(manager.namespace_index(), 5001);
//! assert_eq!(
//!     manager.read(&liha, AttributeId::DisplayName)?,
//!     Variant::String("LiHa".into())
//! );
//! assert_eq!(outbox.get(&ids::OBJECTS_FOLDER).len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod address_space;
pub mod allocator;
pub mod behavior;
pub mod config;
pub mod error;
pub mod hooks;
pub mod host;
pub mod importer;
pub mod manager;
pub mod outbox;
pub mod reconciler;
pub mod serializer;

pub use address_space::{AddressSpace, NodeHandle, ReferenceDescription, ReferenceFilter};
pub use allocator::IdentifierAllocator;
pub use behavior::{BehaviorFactory, BehaviorRegistry, BehaviorResult};
pub use config::{ApplicationConfiguration, LiHaConfiguration};
pub use error::{
    ActivationError, BehaviorError, ConfigError, CreateError, DefinitionError,
    DuplicateDefinitionError, GraphError, ImportError, ServiceError,
};
pub use hooks::{MonitoredItemHooks, NoopHooks};
pub use host::{
    DataChangeMonitoredItem, MonitoredItemCreateRequest, MonitoredItemModifyRequest,
    MonitoredNode, MonitoringMode, NodeManagerFactory, ServerContext, SystemContext,
};
pub use importer::{DefinitionImporter, DefinitionSource, ImportBatch, ImportSummary};
pub use manager::{
    ActivationSummary, LiHaSystemNodeManager, LiHaSystemNodeManagerFactory, LIHA_INSTANCE_NAMESPACE_URI,
    LIHA_NAMESPACE_URI,
};
pub use outbox::ExternalReferences;
