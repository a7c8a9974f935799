//! Node descriptors.

use std::fmt;
use std::sync::Arc;

use crate::{AttributeId, NodeId, QualifiedName, Variant};

/// The class of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    /// An object instance.
    Object,
    /// A variable instance.
    Variable,
    /// A callable method.
    Method,
    /// An object type.
    ObjectType,
    /// A variable type.
    VariableType,
    /// A reference type.
    ReferenceType,
    /// A data type.
    DataType,
    /// A view.
    View,
}

impl NodeClass {
    /// Returns the class name as written in definition sources, minus the
    /// `UA` prefix.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NodeClass::Object => "Object",
            NodeClass::Variable => "Variable",
            NodeClass::Method => "Method",
            NodeClass::ObjectType => "ObjectType",
            NodeClass::VariableType => "VariableType",
            NodeClass::ReferenceType => "ReferenceType",
            NodeClass::DataType => "DataType",
            NodeClass::View => "View",
        }
    }

    /// Wire value of the class mask bit.
    #[must_use]
    pub fn mask(self) -> i32 {
        match self {
            NodeClass::Object => 1,
            NodeClass::Variable => 2,
            NodeClass::Method => 4,
            NodeClass::ObjectType => 8,
            NodeClass::VariableType => 16,
            NodeClass::ReferenceType => 32,
            NodeClass::DataType => 64,
            NodeClass::View => 128,
        }
    }

    /// True for the four type classes.
    #[must_use]
    pub fn is_type(self) -> bool {
        matches!(
            self,
            NodeClass::ObjectType
                | NodeClass::VariableType
                | NodeClass::ReferenceType
                | NodeClass::DataType
        )
    }

    /// True for objects and variables, the classes that carry a type definition.
    #[must_use]
    pub fn has_type_definition(self) -> bool {
        matches!(self, NodeClass::Object | NodeClass::Variable)
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device-specific behavior attached to a node after import.
///
/// A node carrying a behavior is the specialized variant of the generic node
/// that was imported; the behavior is shared by every snapshot of the node.
pub trait NodeBehavior: fmt::Debug + Send + Sync {
    /// Short name of the behavior, for logs and exports.
    fn name(&self) -> &str;

    /// Called once the specialized node has replaced the generic one.
    fn on_attached(&self, _node: &NodeDescriptor) {}
}

/// A node of the address space.
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    /// Identifier; null until allocated.
    pub node_id: NodeId,
    /// Node class.
    pub node_class: NodeClass,
    /// Browse name.
    pub browse_name: QualifiedName,
    /// Display name.
    pub display_name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Type definition of objects and variables.
    pub type_definition: Option<NodeId>,
    /// Class-dependent attributes in declaration order.
    pub attributes: Vec<(AttributeId, Variant)>,
    /// Behavior attached by the substitution pass.
    pub behavior: Option<Arc<dyn NodeBehavior>>,
}

impl NodeDescriptor {
    /// Creates a node with no attributes. The display name defaults to the
    /// browse name.
    #[must_use]
    pub fn new(node_id: NodeId, node_class: NodeClass, browse_name: QualifiedName) -> Self {
        Self {
            node_id,
            node_class,
            display_name: browse_name.name.clone(),
            browse_name,
            description: None,
            type_definition: None,
            attributes: Vec::new(),
            behavior: None,
        }
    }

    /// Returns the stored value of a class-dependent attribute.
    #[must_use]
    pub fn attribute(&self, id: AttributeId) -> Option<&Variant> {
        self.attributes
            .iter()
            .find(|(attr, _)| *attr == id)
            .map(|(_, value)| value)
    }

    /// Sets a class-dependent attribute, keeping its position if present.
    pub fn set_attribute(&mut self, id: AttributeId, value: Variant) {
        match self.attributes.iter_mut().find(|(attr, _)| *attr == id) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((id, value)),
        }
    }

    /// Reads any attribute, including the ones held as fields.
    #[must_use]
    pub fn read(&self, id: AttributeId) -> Option<Variant> {
        match id {
            AttributeId::NodeId => Some(Variant::NodeId(self.node_id.clone())),
            AttributeId::NodeClass => Some(Variant::Int32(self.node_class.mask())),
            AttributeId::BrowseName => Some(Variant::String(self.browse_name.to_string())),
            AttributeId::DisplayName => Some(Variant::String(self.display_name.clone())),
            AttributeId::Description => self.description.clone().map(Variant::String),
            other => self.attribute(other).cloned(),
        }
    }

    /// Declared data type of a variable, if any.
    #[must_use]
    pub fn data_type(&self) -> Option<&NodeId> {
        match self.attribute(AttributeId::DataType) {
            Some(Variant::NodeId(id)) => Some(id),
            _ => None,
        }
    }

    /// Access level of a variable; variables without one are read-only.
    #[must_use]
    pub fn access_level(&self) -> u8 {
        self.attribute(AttributeId::AccessLevel)
            .and_then(Variant::as_u32)
            .and_then(|v| u8::try_from(v).ok())
            .unwrap_or(crate::ACCESS_CURRENT_READ)
    }
}
