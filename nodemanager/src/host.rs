//! Types exchanged with the host server runtime.
//!
//! The session and subscription engines live in the host; this module only
//! describes what they hand to a node manager.

use std::time::Duration;

use liha_model::{AttributeId, NodeId, SharedNamespaceTable};

use crate::config::ApplicationConfiguration;
use crate::error::CreateError;

/// What a node manager receives from the server at construction.
#[derive(Debug, Clone)]
pub struct ServerContext {
    /// The server-wide namespace table.
    pub namespaces: SharedNamespaceTable,
}

impl ServerContext {
    /// Wraps a shared namespace table.
    #[must_use]
    pub fn new(namespaces: SharedNamespaceTable) -> Self {
        Self { namespaces }
    }
}

/// Per-call context of a host request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemContext {
    /// Session the call belongs to, if any.
    pub session_id: Option<NodeId>,
}

/// How a monitored item reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MonitoringMode {
    /// Neither sampled nor reported.
    Disabled,
    /// Sampled and queued, not reported.
    Sampling,
    /// Sampled and reported.
    #[default]
    Reporting,
}

/// A client's request to create a monitored item.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredItemCreateRequest {
    /// The monitored node.
    pub node_id: NodeId,
    /// The monitored attribute.
    pub attribute_id: AttributeId,
    /// Initial mode.
    pub monitoring_mode: MonitoringMode,
    /// Requested sampling interval.
    pub sampling_interval: Duration,
    /// Requested queue size.
    pub queue_size: u32,
}

/// A client's request to change a monitored item.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredItemModifyRequest {
    /// Requested sampling interval.
    pub sampling_interval: Duration,
    /// Requested queue size.
    pub queue_size: u32,
}

/// The node a monitored item samples, as seen by the monitoring engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredNode {
    /// The node.
    pub node_id: NodeId,
    /// Number of data-change items currently on the node.
    pub item_count: usize,
}

/// A data-change monitored item owned by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct DataChangeMonitoredItem {
    /// Server-assigned item id.
    pub id: u32,
    /// The monitored attribute.
    pub attribute_id: AttributeId,
    /// Current mode.
    pub monitoring_mode: MonitoringMode,
    /// Revised sampling interval.
    pub sampling_interval: Duration,
}

/// Creates node managers for the host.
pub trait NodeManagerFactory {
    /// The node manager type built by this factory.
    type Manager;

    /// Namespace URIs served by the managers this factory builds.
    fn namespace_uris(&self) -> Vec<String>;

    /// Builds a node manager for `server`.
    ///
    /// # Errors
    ///
    /// Returns [`CreateError`] if the manager's configuration extension is
    /// invalid or its namespaces cannot be registered.
    fn create(
        &self,
        server: &ServerContext,
        configuration: &ApplicationConfiguration,
    ) -> Result<Self::Manager, CreateError>;
}
