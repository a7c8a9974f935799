//! Type definition validator.

use liha_nodemanager::AddressSpace;

use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "types/definitions";

/// Checks that every object and variable names its type definition.
pub fn validate(space: &AddressSpace) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    let untyped: Vec<String> = space
        .nodes()
        .filter(|(_, handle)| {
            let node = handle.read();
            node.node_class.has_type_definition() && node.type_definition.is_none()
        })
        .map(|(id, _)| id.to_string())
        .collect();

    if untyped.is_empty() {
        report.push(TestResult::pass(VALIDATOR, "all objects and variables are typed"));
    } else {
        report.push(TestResult::fail(
            VALIDATOR,
            format!("{} objects or variables have no type definition", untyped.len()),
            untyped,
        ));
    }
    report
}
