//! Well-known identifiers of the standard namespace.
//!
//! Nodes in namespace 0 are owned by the host's core node manager. Definition
//! sources refer to them by id or by alias; [`standard_alias`] resolves the
//! aliases every source may use without declaring them.

use crate::NodeId;

/// URI of the standard namespace (always index 0).
pub const STANDARD_NAMESPACE_URI: &str = "http://opcfoundation.org/UA/";

// Folders and well-known objects
/// `RootFolder`.
pub const ROOT_FOLDER: NodeId = NodeId::numeric(0, 84);
/// `ObjectsFolder`, the top folder clients browse from.
pub const OBJECTS_FOLDER: NodeId = NodeId::numeric(0, 85);
/// `TypesFolder`.
pub const TYPES_FOLDER: NodeId = NodeId::numeric(0, 86);
/// `ObjectTypesFolder`.
pub const OBJECT_TYPES_FOLDER: NodeId = NodeId::numeric(0, 88);
/// `VariableTypesFolder`.
pub const VARIABLE_TYPES_FOLDER: NodeId = NodeId::numeric(0, 89);
/// The `Server` object.
pub const SERVER: NodeId = NodeId::numeric(0, 2253);

// Types
/// `BaseObjectType`.
pub const BASE_OBJECT_TYPE: NodeId = NodeId::numeric(0, 58);
/// `FolderType`.
pub const FOLDER_TYPE: NodeId = NodeId::numeric(0, 61);
/// `BaseVariableType`.
pub const BASE_VARIABLE_TYPE: NodeId = NodeId::numeric(0, 62);
/// `BaseDataVariableType`.
pub const BASE_DATA_VARIABLE_TYPE: NodeId = NodeId::numeric(0, 63);
/// `PropertyType`.
pub const PROPERTY_TYPE: NodeId = NodeId::numeric(0, 68);

// Modelling rules
/// `ModellingRule_Mandatory`.
pub const MODELLING_RULE_MANDATORY: NodeId = NodeId::numeric(0, 78);
/// `ModellingRule_Optional`.
pub const MODELLING_RULE_OPTIONAL: NodeId = NodeId::numeric(0, 80);

// Reference types
/// `References`, the abstract root of all reference types.
pub const REFERENCES: NodeId = NodeId::numeric(0, 31);
/// `NonHierarchicalReferences`.
pub const NON_HIERARCHICAL_REFERENCES: NodeId = NodeId::numeric(0, 32);
/// `HierarchicalReferences`.
pub const HIERARCHICAL_REFERENCES: NodeId = NodeId::numeric(0, 33);
/// `HasChild`.
pub const HAS_CHILD: NodeId = NodeId::numeric(0, 34);
/// `Organizes`.
pub const ORGANIZES: NodeId = NodeId::numeric(0, 35);
/// `HasEventSource`.
pub const HAS_EVENT_SOURCE: NodeId = NodeId::numeric(0, 36);
/// `HasModellingRule`.
pub const HAS_MODELLING_RULE: NodeId = NodeId::numeric(0, 37);
/// `HasEncoding`.
pub const HAS_ENCODING: NodeId = NodeId::numeric(0, 38);
/// `HasDescription`.
pub const HAS_DESCRIPTION: NodeId = NodeId::numeric(0, 39);
/// `HasTypeDefinition`.
pub const HAS_TYPE_DEFINITION: NodeId = NodeId::numeric(0, 40);
/// `GeneratesEvent`.
pub const GENERATES_EVENT: NodeId = NodeId::numeric(0, 41);
/// `Aggregates`.
pub const AGGREGATES: NodeId = NodeId::numeric(0, 44);
/// `HasSubtype`.
pub const HAS_SUBTYPE: NodeId = NodeId::numeric(0, 45);
/// `HasProperty`.
pub const HAS_PROPERTY: NodeId = NodeId::numeric(0, 46);
/// `HasComponent`.
pub const HAS_COMPONENT: NodeId = NodeId::numeric(0, 47);
/// `HasNotifier`.
pub const HAS_NOTIFIER: NodeId = NodeId::numeric(0, 48);
/// `HasOrderedComponent`.
pub const HAS_ORDERED_COMPONENT: NodeId = NodeId::numeric(0, 49);
/// `HasInterface`.
pub const HAS_INTERFACE: NodeId = NodeId::numeric(0, 17603);
/// `HasAddIn`.
pub const HAS_ADD_IN: NodeId = NodeId::numeric(0, 17604);

// Data types
/// `Boolean`.
pub const BOOLEAN: NodeId = NodeId::numeric(0, 1);
/// `SByte`.
pub const SBYTE: NodeId = NodeId::numeric(0, 2);
/// `Byte`.
pub const BYTE: NodeId = NodeId::numeric(0, 3);
/// `Int16`.
pub const INT16: NodeId = NodeId::numeric(0, 4);
/// `UInt16`.
pub const UINT16: NodeId = NodeId::numeric(0, 5);
/// `Int32`.
pub const INT32: NodeId = NodeId::numeric(0, 6);
/// `UInt32`.
pub const UINT32: NodeId = NodeId::numeric(0, 7);
/// `Int64`.
pub const INT64: NodeId = NodeId::numeric(0, 8);
/// `UInt64`.
pub const UINT64: NodeId = NodeId::numeric(0, 9);
/// `Float`.
pub const FLOAT: NodeId = NodeId::numeric(0, 10);
/// `Double`.
pub const DOUBLE: NodeId = NodeId::numeric(0, 11);
/// `String`.
pub const STRING: NodeId = NodeId::numeric(0, 12);
/// `NodeId` (the data type).
pub const NODE_ID: NodeId = NodeId::numeric(0, 17);
/// `LocalizedText`.
pub const LOCALIZED_TEXT: NodeId = NodeId::numeric(0, 21);
/// `BaseDataType`.
pub const BASE_DATA_TYPE: NodeId = NodeId::numeric(0, 24);
/// `Number`.
pub const NUMBER: NodeId = NodeId::numeric(0, 26);

/// Resolves an alias every definition source may use without declaring it.
#[must_use]
pub fn standard_alias(name: &str) -> Option<NodeId> {
    let id = match name {
        "References" => REFERENCES,
        "NonHierarchicalReferences" => NON_HIERARCHICAL_REFERENCES,
        "HierarchicalReferences" => HIERARCHICAL_REFERENCES,
        "HasChild" => HAS_CHILD,
        "Organizes" => ORGANIZES,
        "HasEventSource" => HAS_EVENT_SOURCE,
        "HasModellingRule" => HAS_MODELLING_RULE,
        "HasEncoding" => HAS_ENCODING,
        "HasDescription" => HAS_DESCRIPTION,
        "HasTypeDefinition" => HAS_TYPE_DEFINITION,
        "GeneratesEvent" => GENERATES_EVENT,
        "Aggregates" => AGGREGATES,
        "HasSubtype" => HAS_SUBTYPE,
        "HasProperty" => HAS_PROPERTY,
        "HasComponent" => HAS_COMPONENT,
        "HasNotifier" => HAS_NOTIFIER,
        "HasOrderedComponent" => HAS_ORDERED_COMPONENT,
        "HasInterface" => HAS_INTERFACE,
        "HasAddIn" => HAS_ADD_IN,
        "Boolean" => BOOLEAN,
        "SByte" => SBYTE,
        "Byte" => BYTE,
        "Int16" => INT16,
        "UInt16" => UINT16,
        "Int32" => INT32,
        "UInt32" => UINT32,
        "Int64" => INT64,
        "UInt64" => UINT64,
        "Float" => FLOAT,
        "Double" => DOUBLE,
        "String" => STRING,
        "NodeId" => NODE_ID,
        "LocalizedText" => LOCALIZED_TEXT,
        "BaseDataType" => BASE_DATA_TYPE,
        "Number" => NUMBER,
        _ => return None,
    };
    Some(id)
}

/// Returns true if `reference_type` is one of the standard hierarchical
/// reference types (the ones browsing follows to build a tree).
#[must_use]
pub fn is_hierarchical(reference_type: &NodeId) -> bool {
    [
        HIERARCHICAL_REFERENCES,
        HAS_CHILD,
        ORGANIZES,
        HAS_EVENT_SOURCE,
        AGGREGATES,
        HAS_SUBTYPE,
        HAS_PROPERTY,
        HAS_COMPONENT,
        HAS_NOTIFIER,
        HAS_ORDERED_COMPONENT,
        HAS_ADD_IN,
    ]
    .contains(reference_type)
}

/// Returns true if `reference_type` is `ancestor` or one of its standard
/// subtypes.
#[must_use]
pub fn is_subtype_of(reference_type: &NodeId, ancestor: &NodeId) -> bool {
    if reference_type == ancestor || *ancestor == REFERENCES {
        return true;
    }
    let mut current = reference_type.clone();
    while let Some(parent) = standard_supertype(&current) {
        if parent == *ancestor {
            return true;
        }
        current = parent;
    }
    false
}

fn standard_supertype(reference_type: &NodeId) -> Option<NodeId> {
    let parent = match reference_type.as_numeric()? {
        _ if reference_type.namespace_index != 0 => return None,
        32 | 33 => REFERENCES,
        34 | 35 | 36 => HIERARCHICAL_REFERENCES,
        44 | 45 => HAS_CHILD,
        46 | 47 | 17604 => AGGREGATES,
        49 => HAS_COMPONENT,
        48 => HAS_EVENT_SOURCE,
        37 | 38 | 39 | 40 | 41 | 17603 => NON_HIERARCHICAL_REFERENCES,
        _ => return None,
    };
    Some(parent)
}
