//! Address-space validators.
//!
//! Each validator inspects an activated graph and returns a
//! [`ConformanceReport`](crate::ConformanceReport) with one result per check.

pub mod hierarchy;
pub mod identity;
pub mod references;
pub mod types;
