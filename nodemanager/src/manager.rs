//! The LiHa system node manager.
//!
//! Owns the address space of one LiHa liquid-handling system. Activation
//! imports the configured definition sources in order, runs the behavior
//! substitution pass and only then starts serving browse, read and write
//! calls. A failed activation publishes nothing.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use liha_model::{
    AttributeId, BrowseDirection, NodeClass, NodeDescriptor, NodeId, SharedNamespaceTable,
    Variant, ACCESS_CURRENT_WRITE,
};
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use tracing::{info, warn};

use crate::address_space::{AddressSpace, ReferenceDescription, ReferenceFilter};
use crate::behavior::BehaviorRegistry;
use crate::config::{ApplicationConfiguration, LiHaConfiguration};
use crate::error::{ActivationError, CreateError, ImportError, ServiceError};
use crate::hooks::{MonitoredItemHooks, NoopHooks};
use crate::host::{
    DataChangeMonitoredItem, MonitoredItemCreateRequest, MonitoredItemModifyRequest,
    MonitoredNode, MonitoringMode, NodeManagerFactory, ServerContext, SystemContext,
};
use crate::importer::{self, DefinitionImporter, DefinitionSource, ImportContext, ImportSummary};
use crate::outbox::ExternalReferences;

/// Namespace of the LiHa system types.
pub const LIHA_NAMESPACE_URI: &str = "http://liha.org/UA/LiHaSystem";

/// Namespace of nodes created for this LiHa instance.
pub const LIHA_INSTANCE_NAMESPACE_URI: &str = "http://liha.org/UA/LiHaSystem/Instance";

/// Totals of a successful activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationSummary {
    /// Definition sources imported by the activation.
    pub sources: usize,
    /// Nodes in the address space.
    pub nodes: usize,
    /// Nodes whose identifier was allocated during activation.
    pub allocated: usize,
    /// Nodes that received a behavior.
    pub specialized: usize,
    /// Reverse edges queued for other node managers.
    pub external_references: usize,
}

#[derive(Debug)]
struct ManagerState {
    space: AddressSpace,
    loaded_models: BTreeSet<String>,
    imported_sources: Vec<String>,
    ready: bool,
}

impl ManagerState {
    fn new(allocation_namespace: u16) -> Self {
        Self {
            space: AddressSpace::new(allocation_namespace),
            loaded_models: BTreeSet::new(),
            imported_sources: Vec::new(),
            ready: false,
        }
    }
}

/// Node manager for the LiHa system namespaces.
pub struct LiHaSystemNodeManager {
    namespaces: SharedNamespaceTable,
    namespace_index: u16,
    instance_namespace_index: u16,
    configuration: LiHaConfiguration,
    importer: DefinitionImporter,
    behaviors: BehaviorRegistry,
    hooks: Arc<dyn MonitoredItemHooks>,
    state: RwLock<ManagerState>,
}

impl std::fmt::Debug for LiHaSystemNodeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiHaSystemNodeManager")
            .field("namespace_index", &self.namespace_index)
            .field("instance_namespace_index", &self.instance_namespace_index)
            .field("configuration", &self.configuration)
            .field("behaviors", &self.behaviors)
            .finish_non_exhaustive()
    }
}

impl LiHaSystemNodeManager {
    /// Creates an inactive node manager. Both LiHa namespaces are registered
    /// in the server's table; identifiers are allocated in the instance
    /// namespace.
    ///
    /// # Errors
    ///
    /// - [`CreateError::Config`] if the `LiHaConfiguration` extension is
    ///   invalid.
    /// - [`CreateError::NamespaceTableFull`] if a namespace cannot be
    ///   registered.
    pub fn new(
        server: &ServerContext,
        configuration: &ApplicationConfiguration,
    ) -> Result<Self, CreateError> {
        let configuration = LiHaConfiguration::from_application(configuration)?;
        let register = |uri: &str| {
            server
                .namespaces
                .get_index_or_append(uri)
                .ok_or_else(|| CreateError::NamespaceTableFull(uri.to_owned()))
        };
        let namespace_index = register(LIHA_NAMESPACE_URI)?;
        let instance_namespace_index = register(LIHA_INSTANCE_NAMESPACE_URI)?;

        let mut state = ManagerState::new(instance_namespace_index);
        state.space.claim_namespace(namespace_index);

        Ok(Self {
            namespaces: Arc::clone(&server.namespaces),
            namespace_index,
            instance_namespace_index,
            configuration,
            importer: DefinitionImporter,
            behaviors: BehaviorRegistry::new(),
            hooks: Arc::new(NoopHooks),
            state: RwLock::new(state),
        })
    }

    /// Replaces the behavior registry used at activation.
    #[must_use]
    pub fn with_behaviors(mut self, behaviors: BehaviorRegistry) -> Self {
        self.behaviors = behaviors;
        self
    }

    /// Replaces the monitored-item hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn MonitoredItemHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Index of [`LIHA_NAMESPACE_URI`].
    #[must_use]
    pub fn namespace_index(&self) -> u16 {
        self.namespace_index
    }

    /// Index of [`LIHA_INSTANCE_NAMESPACE_URI`], where identifiers are
    /// allocated.
    #[must_use]
    pub fn instance_namespace_index(&self) -> u16 {
        self.instance_namespace_index
    }

    /// The server's namespace table.
    #[must_use]
    pub fn namespaces(&self) -> &SharedNamespaceTable {
        &self.namespaces
    }

    /// The parsed configuration.
    #[must_use]
    pub fn configuration(&self) -> &LiHaConfiguration {
        &self.configuration
    }

    /// Returns true once activation has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.read().ready
    }

    /// Names of the sources imported so far, in order.
    #[must_use]
    pub fn imported_sources(&self) -> Vec<String> {
        self.state.read().imported_sources.clone()
    }

    /// Model URIs imported so far.
    #[must_use]
    pub fn loaded_models(&self) -> BTreeSet<String> {
        self.state.read().loaded_models.clone()
    }

    /// Read access to the graph, for exports and validation.
    #[must_use]
    pub fn address_space(&self) -> MappedRwLockReadGuard<'_, AddressSpace> {
        RwLockReadGuard::map(self.state.read(), |state| &state.space)
    }

    /// Imports one source ahead of activation. The graph is unchanged if the
    /// import fails.
    ///
    /// # Errors
    ///
    /// - [`ImportError::AlreadyActive`] once the manager is active.
    /// - Any other [`ImportError`] from reading, validating or committing the
    ///   source.
    pub fn import_source(
        &self,
        source: &DefinitionSource,
        outbox: &mut ExternalReferences,
    ) -> Result<ImportSummary, ImportError> {
        let mut state = self.state.write();
        if state.ready {
            return Err(ImportError::AlreadyActive);
        }
        self.import_locked(&mut state, source, outbox)
    }

    fn import_locked(
        &self,
        state: &mut ManagerState,
        source: &DefinitionSource,
        outbox: &mut ExternalReferences,
    ) -> Result<ImportSummary, ImportError> {
        let context = ImportContext {
            namespaces: self.namespaces.as_ref(),
            space: &state.space,
            loaded_models: &state.loaded_models,
        };
        let batch = self.importer.read(source, &context)?;
        let models = batch.models.clone();
        let summary = importer::commit(&mut state.space, batch, outbox)?;
        state.loaded_models.extend(models);
        state.imported_sources.push(source.name.clone());
        info!(
            source = %source.name,
            nodes = summary.nodes,
            allocated = summary.allocated,
            local_references = summary.references.local,
            external_references = summary.references.external,
            adopted = summary.references.adopted,
            "imported definition source"
        );
        Ok(summary)
    }

    /// Activates the manager with the sources named by its configuration,
    /// read from disk in order.
    ///
    /// # Errors
    ///
    /// See [`create_address_space_from`](Self::create_address_space_from); an
    /// unreadable file fails with [`ActivationError::Import`].
    pub fn create_address_space(
        &self,
        outbox: &mut ExternalReferences,
    ) -> Result<ActivationSummary, ActivationError> {
        let mut sources = Vec::with_capacity(self.configuration.sources.len());
        for path in self.configuration.source_paths() {
            let source = DefinitionSource::from_path(&path).map_err(|error| {
                ActivationError::Import {
                    source_name: path.display().to_string(),
                    error,
                }
            })?;
            sources.push(source);
        }
        self.create_address_space_from(&sources, outbox)
    }

    /// Activates the manager: imports `sources` in order, runs behavior
    /// substitution and marks the manager ready. The whole phase runs under
    /// the exclusive lock. On failure the graph is reset to empty and
    /// `outbox` is unchanged; on success the reverse edges for other node
    /// managers are added to `outbox`.
    ///
    /// # Errors
    ///
    /// - [`ActivationError::AlreadyActive`] if called twice.
    /// - [`ActivationError::Import`] naming the first source that failed.
    /// - [`ActivationError::Substitution`] if behavior substitution fails.
    pub fn create_address_space_from(
        &self,
        sources: &[DefinitionSource],
        outbox: &mut ExternalReferences,
    ) -> Result<ActivationSummary, ActivationError> {
        let mut state = self.state.write();
        if state.ready {
            return Err(ActivationError::AlreadyActive);
        }

        let mut pending = outbox.clone();
        match self.activate_locked(&mut state, sources, &mut pending) {
            Ok(mut summary) => {
                summary.external_references = pending.edge_count();
                *outbox = pending;
                state.ready = true;
                info!(
                    sources = summary.sources,
                    nodes = summary.nodes,
                    allocated = summary.allocated,
                    specialized = summary.specialized,
                    "LiHa system address space is active"
                );
                Ok(summary)
            }
            Err(error) => {
                warn!(%error, "activation failed, discarding address space");
                *state = ManagerState::new(self.instance_namespace_index);
                state.space.claim_namespace(self.namespace_index);
                Err(error)
            }
        }
    }

    fn activate_locked(
        &self,
        state: &mut ManagerState,
        sources: &[DefinitionSource],
        outbox: &mut ExternalReferences,
    ) -> Result<ActivationSummary, ActivationError> {
        let mut summary = ActivationSummary::default();
        for source in sources {
            let imported = self
                .import_locked(state, source, outbox)
                .map_err(|error| ActivationError::Import {
                    source_name: source.name.clone(),
                    error,
                })?;
            summary.sources += 1;
            summary.allocated += imported.allocated;
        }
        summary.specialized = self
            .behaviors
            .substitute_all(&mut state.space)
            .map_err(ActivationError::Substitution)?;
        summary.nodes = state.space.len();
        Ok(summary)
    }

    fn ready_state(&self) -> Result<RwLockReadGuard<'_, ManagerState>, ServiceError> {
        let state = self.state.read();
        if state.ready {
            Ok(state)
        } else {
            Err(ServiceError::BadNotReady)
        }
    }

    /// Snapshot of a node.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadNotReady`] before activation,
    /// [`ServiceError::BadNodeIdUnknown`] for unknown nodes.
    pub fn find(&self, node_id: &NodeId) -> Result<NodeDescriptor, ServiceError> {
        self.ready_state()?
            .space
            .find(node_id)
            .ok_or_else(|| ServiceError::BadNodeIdUnknown(node_id.clone()))
    }

    /// Follows the edges of a node.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadNotReady`] before activation,
    /// [`ServiceError::BadNodeIdUnknown`] for unknown nodes.
    pub fn browse(
        &self,
        node_id: &NodeId,
        direction: BrowseDirection,
        filter: &ReferenceFilter,
    ) -> Result<Vec<ReferenceDescription>, ServiceError> {
        self.ready_state()?
            .space
            .browse(node_id, direction, filter)
            .ok_or_else(|| ServiceError::BadNodeIdUnknown(node_id.clone()))
    }

    /// Reads one attribute. Optional attributes that are unset read as
    /// [`Variant::Empty`].
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadNotReady`] before activation,
    /// [`ServiceError::BadNodeIdUnknown`] for unknown nodes and
    /// [`ServiceError::BadAttributeIdInvalid`] for attributes the node class
    /// does not have.
    pub fn read(&self, node_id: &NodeId, attribute: AttributeId) -> Result<Variant, ServiceError> {
        let state = self.ready_state()?;
        let handle = state
            .space
            .node(node_id)
            .ok_or_else(|| ServiceError::BadNodeIdUnknown(node_id.clone()))?;
        let node = handle.read();
        if let Some(value) = node.read(attribute) {
            return Ok(value);
        }
        let optional = attribute == AttributeId::Description
            || (attribute == AttributeId::Value
                && matches!(node.node_class, NodeClass::Variable | NodeClass::VariableType));
        if optional {
            Ok(Variant::Empty)
        } else {
            Err(ServiceError::BadAttributeIdInvalid)
        }
    }

    /// Writes the value of a variable. Only the node's own lock is held for
    /// writing, so writes to different nodes proceed in parallel.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::BadNotReady`] before activation.
    /// - [`ServiceError::BadNodeIdUnknown`] for unknown nodes.
    /// - [`ServiceError::BadAttributeIdInvalid`] if the node has no such
    ///   attribute.
    /// - [`ServiceError::BadNotWritable`] for attributes other than a
    ///   variable's value, or without the current-write access bit.
    /// - [`ServiceError::BadTypeMismatch`] if `value` does not match the
    ///   declared data type.
    pub fn write(
        &self,
        node_id: &NodeId,
        attribute: AttributeId,
        value: Variant,
    ) -> Result<(), ServiceError> {
        let state = self.ready_state()?;
        let handle = state
            .space
            .node(node_id)
            .ok_or_else(|| ServiceError::BadNodeIdUnknown(node_id.clone()))?;
        let mut node = handle.write();
        let is_variable = node.node_class == NodeClass::Variable;
        if attribute != AttributeId::Value || !is_variable {
            let exists = node.read(attribute).is_some()
                || (attribute == AttributeId::Value && node.node_class == NodeClass::VariableType);
            return Err(if exists {
                ServiceError::BadNotWritable
            } else {
                ServiceError::BadAttributeIdInvalid
            });
        }
        if node.access_level() & ACCESS_CURRENT_WRITE == 0 {
            return Err(ServiceError::BadNotWritable);
        }
        if let Some(data_type) = node.data_type() {
            if !value.is_compatible_with(data_type) {
                return Err(ServiceError::BadTypeMismatch);
            }
        }
        node.set_attribute(AttributeId::Value, value);
        Ok(())
    }
}

impl MonitoredItemHooks for LiHaSystemNodeManager {
    fn on_monitored_item_created(
        &self,
        context: &SystemContext,
        request: &MonitoredItemCreateRequest,
        node: &MonitoredNode,
        item: &DataChangeMonitoredItem,
    ) {
        self.hooks
            .on_monitored_item_created(context, request, node, item);
    }

    fn on_monitored_item_modified(
        &self,
        context: &SystemContext,
        request: &MonitoredItemModifyRequest,
        node: &MonitoredNode,
        item: &DataChangeMonitoredItem,
        previous_interval: Duration,
    ) {
        self.hooks
            .on_monitored_item_modified(context, request, node, item, previous_interval);
    }

    fn on_monitored_item_deleted(
        &self,
        context: &SystemContext,
        node: &MonitoredNode,
        item: &DataChangeMonitoredItem,
    ) {
        self.hooks.on_monitored_item_deleted(context, node, item);
    }

    fn on_monitoring_mode_changed(
        &self,
        context: &SystemContext,
        node: &MonitoredNode,
        item: &DataChangeMonitoredItem,
        previous_mode: MonitoringMode,
        current_mode: MonitoringMode,
    ) {
        self.hooks
            .on_monitoring_mode_changed(context, node, item, previous_mode, current_mode);
    }
}

/// Builds [`LiHaSystemNodeManager`]s for the host.
#[derive(Debug, Clone, Default)]
pub struct LiHaSystemNodeManagerFactory {
    behaviors: BehaviorRegistry,
}

impl LiHaSystemNodeManagerFactory {
    /// A factory whose managers use `behaviors` at activation.
    #[must_use]
    pub fn with_behaviors(behaviors: BehaviorRegistry) -> Self {
        Self { behaviors }
    }
}

impl NodeManagerFactory for LiHaSystemNodeManagerFactory {
    type Manager = LiHaSystemNodeManager;

    fn namespace_uris(&self) -> Vec<String> {
        vec![
            LIHA_NAMESPACE_URI.to_owned(),
            LIHA_INSTANCE_NAMESPACE_URI.to_owned(),
        ]
    }

    fn create(
        &self,
        server: &ServerContext,
        configuration: &ApplicationConfiguration,
    ) -> Result<LiHaSystemNodeManager, CreateError> {
        Ok(LiHaSystemNodeManager::new(server, configuration)?.with_behaviors(self.behaviors.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use liha_model::{ids, NamespaceTable, QualifiedName};

    use super::*;

    const SYSTEM: &str = r#"<UANodeSet>
        <NamespaceUris><Uri>http://liha.org/UA/LiHaSystem</Uri></NamespaceUris>
        <Models><Model ModelUri="http://liha.org/UA/LiHaSystem"/></Models>
        <UAObject NodeId="ns=1;i=5001" BrowseName="1:LiHa">
          <References>
            <Reference ReferenceType="Organizes" IsForward="false">i=85</Reference>
            <Reference ReferenceType="HasTypeDefinition">i=58</Reference>
          </References>
        </UAObject>
        <UAVariable NodeId="ns=1;i=6001" BrowseName="1:Temperature" ParentNodeId="ns=1;i=5001" DataType="Double" AccessLevel="3">
          <References><Reference ReferenceType="HasTypeDefinition">i=63</Reference></References>
          <Value><Double>21.5</Double></Value>
        </UAVariable>
        <UAVariable NodeId="ns=1;i=6002" BrowseName="1:Model" ParentNodeId="ns=1;i=5001" DataType="String">
          <References><Reference ReferenceType="HasTypeDefinition">i=68</Reference></References>
          <Value><String>LiHa 8</String></Value>
        </UAVariable>
      </UANodeSet>"#;

    fn manager() -> LiHaSystemNodeManager {
        let server = ServerContext::new(NamespaceTable::shared());
        LiHaSystemNodeManager::new(&server, &ApplicationConfiguration::default()).unwrap()
    }

    fn active() -> LiHaSystemNodeManager {
        let manager = manager();
        let mut outbox = ExternalReferences::new();
        manager
            .create_address_space_from(&[DefinitionSource::new("lihasystem.xml", SYSTEM)], &mut outbox)
            .unwrap();
        manager
    }

    #[test]
    fn registers_both_namespaces() {
        let server = ServerContext::new(NamespaceTable::shared());
        let manager =
            LiHaSystemNodeManager::new(&server, &ApplicationConfiguration::default()).unwrap();
        assert_eq!(server.namespaces.uri(manager.namespace_index()).as_deref(), Some(LIHA_NAMESPACE_URI));
        assert_eq!(
            server.namespaces.uri(manager.instance_namespace_index()).as_deref(),
            Some(LIHA_INSTANCE_NAMESPACE_URI)
        );
        assert_eq!(manager.address_space().allocation_namespace(), manager.instance_namespace_index());
        assert_eq!(manager.configuration(), &LiHaConfiguration::default());
    }

    #[test]
    fn services_wait_for_activation() {
        let manager = manager();
        let id = NodeId::numeric(1, 5001);
        assert_eq!(manager.find(&id).unwrap_err(), ServiceError::BadNotReady);
        assert_eq!(
            manager.read(&id, AttributeId::BrowseName).unwrap_err(),
            ServiceError::BadNotReady
        );
    }

    #[test]
    fn reads_and_writes_values() {
        let manager = active();
        let temperature = NodeId::numeric(1, 6001);
        assert_eq!(
            manager.read(&temperature, AttributeId::Value).unwrap(),
            Variant::Double(21.5)
        );
        manager
            .write(&temperature, AttributeId::Value, Variant::Double(37.0))
            .unwrap();
        assert_eq!(
            manager.read(&temperature, AttributeId::Value).unwrap(),
            Variant::Double(37.0)
        );
        assert_eq!(
            manager.write(&temperature, AttributeId::Value, Variant::String("hot".into())),
            Err(ServiceError::BadTypeMismatch)
        );
        assert_eq!(
            manager.write(&temperature, AttributeId::DisplayName, Variant::String("T".into())),
            Err(ServiceError::BadNotWritable)
        );
    }

    #[test]
    fn write_respects_access_level() {
        let manager = active();
        let model = NodeId::numeric(1, 6002);
        assert_eq!(
            manager.write(&model, AttributeId::Value, Variant::String("LiHa 4".into())),
            Err(ServiceError::BadNotWritable)
        );
        assert_eq!(
            manager.read(&model, AttributeId::Value).unwrap(),
            Variant::String("LiHa 8".into())
        );
    }

    #[test]
    fn read_reports_unknown_nodes_and_attributes() {
        let manager = active();
        let system = NodeId::numeric(1, 5001);
        assert_eq!(
            manager.read(&NodeId::numeric(1, 9999), AttributeId::Value),
            Err(ServiceError::BadNodeIdUnknown(NodeId::numeric(1, 9999)))
        );
        assert_eq!(
            manager.read(&system, AttributeId::Value),
            Err(ServiceError::BadAttributeIdInvalid)
        );
        assert_eq!(
            manager.read(&system, AttributeId::BrowseName).unwrap(),
            Variant::String(QualifiedName::new(1, "LiHa").to_string())
        );
        assert_eq!(manager.read(&system, AttributeId::Description).unwrap(), Variant::Empty);
        assert_eq!(
            manager.write(&system, AttributeId::Value, Variant::Double(1.0)),
            Err(ServiceError::BadAttributeIdInvalid)
        );
    }

    #[test]
    fn second_activation_is_rejected() {
        let manager = active();
        let mut outbox = ExternalReferences::new();
        assert!(matches!(
            manager.create_address_space_from(&[], &mut outbox),
            Err(ActivationError::AlreadyActive)
        ));
        assert!(matches!(
            manager.import_source(&DefinitionSource::new("late.xml", SYSTEM), &mut outbox),
            Err(ImportError::AlreadyActive)
        ));
    }

    #[test]
    fn failed_activation_publishes_nothing() {
        let manager = manager();
        let mut outbox = ExternalReferences::new();
        let sources = [
            DefinitionSource::new("lihasystem.xml", SYSTEM),
            DefinitionSource::new("lihasystem-again.xml", SYSTEM),
        ];
        let err = manager.create_address_space_from(&sources, &mut outbox).unwrap_err();
        assert!(matches!(
            err,
            ActivationError::Import { ref source_name, error: ImportError::Duplicate(_) }
                if source_name == "lihasystem-again.xml"
        ));
        assert!(!manager.is_ready());
        assert!(manager.address_space().is_empty());
        assert!(outbox.is_empty());
        assert!(manager.imported_sources().is_empty());
    }

    #[test]
    fn activation_queues_the_objects_folder_link() {
        let manager = manager();
        let mut outbox = ExternalReferences::new();
        let summary = manager
            .create_address_space_from(&[DefinitionSource::new("lihasystem.xml", SYSTEM)], &mut outbox)
            .unwrap();
        assert_eq!(summary.sources, 1);
        assert_eq!(summary.nodes, 3);
        assert_eq!(summary.external_references, outbox.edge_count());
        assert!(outbox.contains(
            &ids::OBJECTS_FOLDER,
            &liha_model::ReferenceEdge::forward(ids::ORGANIZES, NodeId::numeric(1, 5001))
        ));
        assert_eq!(manager.loaded_models(), BTreeSet::from([LIHA_NAMESPACE_URI.to_owned()]));
    }

    #[test]
    fn factory_reports_namespaces() {
        let factory = LiHaSystemNodeManagerFactory::default();
        assert_eq!(
            factory.namespace_uris(),
            vec![LIHA_NAMESPACE_URI.to_owned(), LIHA_INSTANCE_NAMESPACE_URI.to_owned()]
        );
        let server = ServerContext::new(NamespaceTable::shared());
        let manager = factory.create(&server, &ApplicationConfiguration::default()).unwrap();
        assert!(!manager.is_ready());
    }
}
