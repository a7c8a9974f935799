//! JSON export of the address space.
//!
//! The document has four members: `namespaces` (the server table in index
//! order), `rootNodes` (the nodes a host links under its own folders),
//! `nodes` (every node with its attributes and edges, in identifier order)
//! and `externalReferences` (the outbox, keyed by target).

use serde_json::{json, Map, Value};

use liha_model::{NodeDescriptor, ReferenceEdge, Variant};

use crate::address_space::AddressSpace;
use crate::manager::LiHaSystemNodeManager;
use crate::outbox::ExternalReferences;

/// Serializes the manager's address space and `outbox` to a JSON `Value`.
///
/// The returned value can be pretty-printed with [`serde_json::to_string_pretty`].
#[must_use]
pub fn to_json(manager: &LiHaSystemNodeManager, outbox: &ExternalReferences) -> Value {
    let space = manager.address_space();
    json!({
        "namespaces": manager.namespaces().uris(),
        "allocationNamespace": space.allocation_namespace(),
        "rootNodes": space.root_nodes().iter().map(ToString::to_string).collect::<Vec<_>>(),
        "nodes": build_nodes(&space),
        "externalReferences": build_outbox(outbox),
    })
}

fn build_nodes(space: &AddressSpace) -> Value {
    let nodes: Vec<Value> = space
        .nodes()
        .map(|(id, handle)| {
            let node = handle.read();
            let references: Vec<Value> = space.references(id).iter().map(edge_to_json).collect();
            let mut entry = node_to_json(&node);
            if let Value::Object(map) = &mut entry {
                map.insert("references".to_owned(), Value::Array(references));
            }
            entry
        })
        .collect();
    Value::Array(nodes)
}

fn node_to_json(node: &NodeDescriptor) -> Value {
    let mut attributes = Map::new();
    for (id, value) in &node.attributes {
        attributes.insert(format!("{id:?}"), variant_to_json(value));
    }
    let mut entry = json!({
        "nodeId": node.node_id.to_string(),
        "nodeClass": node.node_class.as_str(),
        "browseName": node.browse_name.to_string(),
        "displayName": node.display_name,
        "attributes": attributes,
    });
    if let Value::Object(map) = &mut entry {
        if let Some(description) = &node.description {
            map.insert("description".to_owned(), json!(description));
        }
        if let Some(type_definition) = &node.type_definition {
            map.insert("typeDefinition".to_owned(), json!(type_definition.to_string()));
        }
        if let Some(behavior) = &node.behavior {
            map.insert("behavior".to_owned(), json!(behavior.name()));
        }
    }
    entry
}

fn edge_to_json(edge: &ReferenceEdge) -> Value {
    json!({
        "referenceType": edge.reference_type.to_string(),
        "isForward": !edge.is_inverse,
        "target": edge.target.to_string(),
    })
}

fn build_outbox(outbox: &ExternalReferences) -> Value {
    let mut map = Map::new();
    for (target, edges) in outbox.iter() {
        map.insert(
            target.to_string(),
            Value::Array(edges.iter().map(edge_to_json).collect()),
        );
    }
    Value::Object(map)
}

/// Converts a value to JSON. Non-finite floats become `null`.
#[must_use]
pub fn variant_to_json(value: &Variant) -> Value {
    match value {
        Variant::Empty => Value::Null,
        Variant::Boolean(v) => json!(v),
        Variant::SByte(v) => json!(v),
        Variant::Byte(v) => json!(v),
        Variant::Int16(v) => json!(v),
        Variant::UInt16(v) => json!(v),
        Variant::Int32(v) => json!(v),
        Variant::UInt32(v) => json!(v),
        Variant::Int64(v) => json!(v),
        Variant::UInt64(v) => json!(v),
        Variant::Float(v) => json!(v),
        Variant::Double(v) => json!(v),
        Variant::String(v) => json!(v),
        Variant::NodeId(v) => json!(v.to_string()),
        Variant::Array(items) => Value::Array(items.iter().map(variant_to_json).collect()),
    }
}
