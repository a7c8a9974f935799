//! Monitored-item lifecycle hooks.
//!
//! The host's monitoring engine calls these after its own state changes. The
//! default implementations do nothing; device-specific node managers
//! override the ones they react to.

use std::time::Duration;

use crate::host::{
    DataChangeMonitoredItem, MonitoredItemCreateRequest, MonitoredItemModifyRequest,
    MonitoredNode, MonitoringMode, SystemContext,
};

/// Extension points around monitored-item state transitions.
pub trait MonitoredItemHooks: Send + Sync {
    /// A monitored item started sampling `node`.
    fn on_monitored_item_created(
        &self,
        _context: &SystemContext,
        _request: &MonitoredItemCreateRequest,
        _node: &MonitoredNode,
        _item: &DataChangeMonitoredItem,
    ) {
    }

    /// The sampling interval of `item` changed from `previous_interval`.
    fn on_monitored_item_modified(
        &self,
        _context: &SystemContext,
        _request: &MonitoredItemModifyRequest,
        _node: &MonitoredNode,
        _item: &DataChangeMonitoredItem,
        _previous_interval: Duration,
    ) {
    }

    /// `item` was deleted.
    fn on_monitored_item_deleted(
        &self,
        _context: &SystemContext,
        _node: &MonitoredNode,
        _item: &DataChangeMonitoredItem,
    ) {
    }

    /// The mode of `item` changed.
    fn on_monitoring_mode_changed(
        &self,
        _context: &SystemContext,
        _node: &MonitoredNode,
        _item: &DataChangeMonitoredItem,
        _previous_mode: MonitoringMode,
        _current_mode: MonitoringMode,
    ) {
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl MonitoredItemHooks for NoopHooks {}
