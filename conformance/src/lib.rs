//! Conformance validators for LiHa system address spaces.
//!
//! After activation a node manager must satisfy the graph guarantees below.
//! Each is checked by one validator and reported as one [`TestResult`].
//!
//! | Check | Guarantee |
//! |-------|-----------|
//! | `identity/unique` | Nodes are keyed by their own id; namespaces are registered |
//! | `references/symmetry` | Every edge has its counterpart locally or in the outbox |
//! | `references/targets` | No edge dangles inside an owned namespace |
//! | `hierarchy/parent` | Every object, variable and method has a parent edge |
//! | `types/definitions` | Every object and variable has a type definition |
//!
//! # Entry Point
//!
//! ```no_run
//! use liha_conformance::run_all;
//! use liha_model::NamespaceTable;
//! use liha_nodemanager::{
//!     ApplicationConfiguration, ExternalReferences, LiHaSystemNodeManager, ServerContext,
//! };
//!
//! let server = ServerContext::new(NamespaceTable::shared());
//! let manager = LiHaSystemNodeManager::new(&server, &ApplicationConfiguration::default())?;
//! let mut outbox = ExternalReferences::new();
//! manager.create_address_space(&mut outbox)?;
//!
//! let report = run_all(&manager, &outbox)?;
//! assert!(report.all_passed());
//! # Ok::<(), anyhow::Error>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod report;
pub mod validators;

use liha_nodemanager::{ExternalReferences, LiHaSystemNodeManager};

pub use report::{ConformanceReport, Severity, TestResult};

/// Runs all validators against an activated node manager and its outbox.
///
/// Validators are run in this order:
/// 1. Node identity
/// 2. Reference symmetry and targets
/// 3. Instance hierarchy
/// 4. Type definitions
///
/// # Errors
///
/// Returns an error if the node manager has not been activated.
pub fn run_all(
    manager: &LiHaSystemNodeManager,
    outbox: &ExternalReferences,
) -> anyhow::Result<ConformanceReport> {
    if !manager.is_ready() {
        anyhow::bail!("the node manager has not been activated");
    }
    let space = manager.address_space();
    let mut report = ConformanceReport::new();

    report.extend(validators::identity::validate(&space, manager.namespaces()));
    report.extend(validators::references::validate(&space, outbox));
    report.extend(validators::hierarchy::validate(&space));
    report.extend(validators::types::validate(&space));

    Ok(report)
}
