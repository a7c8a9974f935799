//! Hierarchy validator: every instance node can be browsed up to a parent.

use liha_model::NodeClass;
use liha_nodemanager::AddressSpace;

use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "hierarchy/parent";

/// Checks that objects, variables and methods have an inverse hierarchical
/// edge.
pub fn validate(space: &AddressSpace) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    let mut orphans = Vec::new();
    let mut instances = 0usize;

    for (id, handle) in space.nodes() {
        let class = handle.read().node_class;
        if !matches!(class, NodeClass::Object | NodeClass::Variable | NodeClass::Method) {
            continue;
        }
        instances += 1;
        if !space.references(id).iter().any(|e| e.is_parent_link()) {
            orphans.push(format!("{id} ({class})"));
        }
    }

    if orphans.is_empty() {
        report.push(TestResult::pass(
            VALIDATOR,
            format!("{instances} instance nodes have a parent"),
        ));
    } else {
        report.push(TestResult::fail(
            VALIDATOR,
            format!("{} instance nodes cannot be browsed to a parent", orphans.len()),
            orphans,
        ));
    }
    report
}
