//! Node identity validator.
//!
//! - Every node is stored under its own identifier.
//! - Every identifier uses a namespace index registered in the server table.

use liha_model::NamespaceTable;
use liha_nodemanager::AddressSpace;

use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "identity/unique";

/// Checks node keys against descriptor ids and the namespace table.
pub fn validate(space: &AddressSpace, namespaces: &NamespaceTable) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    let mut violations = Vec::new();

    for (key, handle) in space.nodes() {
        let node = handle.read();
        if node.node_id != *key {
            violations.push(format!("{key} stores node {}", node.node_id));
        }
        if namespaces.uri(key.namespace_index).is_none() {
            violations.push(format!("{key} uses unregistered namespace {}", key.namespace_index));
        }
    }

    if violations.is_empty() {
        report.push(TestResult::pass(
            VALIDATOR,
            format!("{} nodes have unique, registered identifiers", space.len()),
        ));
    } else {
        report.push(TestResult::fail(
            VALIDATOR,
            format!("{} identity violations", violations.len()),
            violations,
        ));
    }
    report
}
