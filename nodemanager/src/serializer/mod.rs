//! Serializers for an activated address space.
//!
//! - **JSON** ([`json`]): namespaces, nodes with attributes and references,
//!   and the pending external references.

pub mod json;
