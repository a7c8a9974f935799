//! Reference graph validators.
//!
//! - `references/symmetry`: every edge has its counterpart, either on the
//!   target in this graph or queued in the outbox under the target.
//! - `references/targets`: no edge points at a missing node of a namespace
//!   this graph serves.

use liha_nodemanager::{AddressSpace, ExternalReferences};

use crate::report::{ConformanceReport, TestResult};

/// Runs both reference checks.
pub fn validate(space: &AddressSpace, outbox: &ExternalReferences) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    report.push(symmetry(space, outbox));
    report.push(targets(space));
    report
}

/// Checks that every edge has a counterpart.
pub fn symmetry(space: &AddressSpace, outbox: &ExternalReferences) -> TestResult {
    const VALIDATOR: &str = "references/symmetry";
    let mut missing = Vec::new();
    let mut queued = 0usize;

    for source in space.node_ids() {
        for edge in space.references(source) {
            let reverse = edge.reversed(source);
            if space.contains(&edge.target) {
                if !space.references(&edge.target).contains(&reverse) {
                    missing.push(format!("{source} -> {} ({})", edge.target, edge.reference_type));
                }
            } else if outbox.contains(&edge.target, &reverse) {
                queued += 1;
            } else {
                missing.push(format!(
                    "{source} -> {} ({}) not queued",
                    edge.target, edge.reference_type
                ));
            }
        }
    }

    if missing.is_empty() {
        TestResult::pass(
            VALIDATOR,
            format!(
                "{} edges are symmetric, {queued} counterparts queued for other node managers",
                space.reference_count()
            ),
        )
    } else {
        TestResult::fail(
            VALIDATOR,
            format!("{} edges lack a counterpart", missing.len()),
            missing,
        )
    }
}

/// Checks that no edge dangles inside the graph's own namespaces.
pub fn targets(space: &AddressSpace) -> TestResult {
    const VALIDATOR: &str = "references/targets";
    let mut dangling = Vec::new();
    for source in space.node_ids() {
        for edge in space.references(source) {
            if space.owns_namespace(edge.target.namespace_index) && !space.contains(&edge.target) {
                dangling.push(format!("{source} -> {}", edge.target));
            }
        }
    }

    if dangling.is_empty() {
        TestResult::pass(VALIDATOR, "all owned targets exist")
    } else {
        TestResult::fail(
            VALIDATOR,
            format!("{} edges target missing nodes", dangling.len()),
            dangling,
        )
    }
}
