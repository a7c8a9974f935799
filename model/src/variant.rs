//! Attribute values.

use std::fmt;

use crate::{ids, NodeId};

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Variant {
    /// No value.
    #[default]
    Empty,
    /// `Boolean`.
    Boolean(bool),
    /// `SByte`.
    SByte(i8),
    /// `Byte`.
    Byte(u8),
    /// `Int16`.
    Int16(i16),
    /// `UInt16`.
    UInt16(u16),
    /// `Int32`.
    Int32(i32),
    /// `UInt32`.
    UInt32(u32),
    /// `Int64`.
    Int64(i64),
    /// `UInt64`.
    UInt64(u64),
    /// `Float`.
    Float(f32),
    /// `Double`.
    Double(f64),
    /// `String`.
    String(String),
    /// `NodeId`.
    NodeId(NodeId),
    /// A homogeneous one-dimensional array.
    Array(Vec<Variant>),
}

impl Variant {
    /// The standard data type of a scalar value. Arrays report their element
    /// type; empty values and empty arrays have none.
    #[must_use]
    pub fn data_type(&self) -> Option<NodeId> {
        let id = match self {
            Variant::Empty => return None,
            Variant::Boolean(_) => ids::BOOLEAN,
            Variant::SByte(_) => ids::SBYTE,
            Variant::Byte(_) => ids::BYTE,
            Variant::Int16(_) => ids::INT16,
            Variant::UInt16(_) => ids::UINT16,
            Variant::Int32(_) => ids::INT32,
            Variant::UInt32(_) => ids::UINT32,
            Variant::Int64(_) => ids::INT64,
            Variant::UInt64(_) => ids::UINT64,
            Variant::Float(_) => ids::FLOAT,
            Variant::Double(_) => ids::DOUBLE,
            Variant::String(_) => ids::STRING,
            Variant::NodeId(_) => ids::NODE_ID,
            Variant::Array(items) => return items.first().and_then(Variant::data_type),
        };
        Some(id)
    }

    /// Returns true for numeric scalars.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Variant::SByte(_)
                | Variant::Byte(_)
                | Variant::Int16(_)
                | Variant::UInt16(_)
                | Variant::Int32(_)
                | Variant::UInt32(_)
                | Variant::Int64(_)
                | Variant::UInt64(_)
                | Variant::Float(_)
                | Variant::Double(_)
        )
    }

    /// Returns true if this value may be stored in a variable declared with
    /// `data_type`. Abstract standard types accept any matching value; types
    /// outside the standard namespace are not checked.
    #[must_use]
    pub fn is_compatible_with(&self, data_type: &NodeId) -> bool {
        if matches!(self, Variant::Empty) || data_type.namespace_index != 0 {
            return true;
        }
        if *data_type == ids::BASE_DATA_TYPE {
            return true;
        }
        if let Variant::Array(items) = self {
            return items.iter().all(|v| v.is_compatible_with(data_type));
        }
        if *data_type == ids::NUMBER {
            return self.is_numeric();
        }
        if *data_type == ids::LOCALIZED_TEXT {
            return matches!(self, Variant::String(_));
        }
        match self.data_type() {
            Some(actual) => actual == *data_type,
            None => true,
        }
    }

    /// Returns the boolean payload, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Widens an unsigned integer payload to `u32` where it fits.
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Variant::Byte(v) => Some(u32::from(*v)),
            Variant::UInt16(v) => Some(u32::from(*v)),
            Variant::UInt32(v) => Some(*v),
            Variant::Int32(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Empty => f.write_str("<empty>"),
            Variant::Boolean(v) => write!(f, "{v}"),
            Variant::SByte(v) => write!(f, "{v}"),
            Variant::Byte(v) => write!(f, "{v}"),
            Variant::Int16(v) => write!(f, "{v}"),
            Variant::UInt16(v) => write!(f, "{v}"),
            Variant::Int32(v) => write!(f, "{v}"),
            Variant::UInt32(v) => write!(f, "{v}"),
            Variant::Int64(v) => write!(f, "{v}"),
            Variant::UInt64(v) => write!(f, "{v}"),
            Variant::Float(v) => write!(f, "{v}"),
            Variant::Double(v) => write!(f, "{v}"),
            Variant::String(v) => f.write_str(v),
            Variant::NodeId(v) => write!(f, "{v}"),
            Variant::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Identifies an attribute of a node, numbered as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeId {
    /// `NodeId`.
    NodeId = 1,
    /// `NodeClass`.
    NodeClass = 2,
    /// `BrowseName`.
    BrowseName = 3,
    /// `DisplayName`.
    DisplayName = 4,
    /// `Description`.
    Description = 5,
    /// `IsAbstract` (types).
    IsAbstract = 8,
    /// `Symmetric` (reference types).
    Symmetric = 9,
    /// `InverseName` (reference types).
    InverseName = 10,
    /// `EventNotifier` (objects, views).
    EventNotifier = 12,
    /// `Value` (variables, variable types).
    Value = 13,
    /// `DataType` (variables, variable types).
    DataType = 14,
    /// `ValueRank` (variables, variable types).
    ValueRank = 15,
    /// `AccessLevel` (variables).
    AccessLevel = 17,
    /// `UserAccessLevel` (variables).
    UserAccessLevel = 18,
    /// `MinimumSamplingInterval` (variables).
    MinimumSamplingInterval = 19,
    /// `Historizing` (variables).
    Historizing = 20,
    /// `Executable` (methods).
    Executable = 21,
}

impl AttributeId {
    /// Looks up an attribute by its wire number.
    #[must_use]
    pub fn from_u32(value: u32) -> Option<Self> {
        let id = match value {
            1 => AttributeId::NodeId,
            2 => AttributeId::NodeClass,
            3 => AttributeId::BrowseName,
            4 => AttributeId::DisplayName,
            5 => AttributeId::Description,
            8 => AttributeId::IsAbstract,
            9 => AttributeId::Symmetric,
            10 => AttributeId::InverseName,
            12 => AttributeId::EventNotifier,
            13 => AttributeId::Value,
            14 => AttributeId::DataType,
            15 => AttributeId::ValueRank,
            17 => AttributeId::AccessLevel,
            18 => AttributeId::UserAccessLevel,
            19 => AttributeId::MinimumSamplingInterval,
            20 => AttributeId::Historizing,
            21 => AttributeId::Executable,
            _ => return None,
        };
        Some(id)
    }
}

/// Access level bit granting reads of the current value.
pub const ACCESS_CURRENT_READ: u8 = 0x01;
/// Access level bit granting writes of the current value.
pub const ACCESS_CURRENT_WRITE: u8 = 0x02;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_of_scalars_and_arrays() {
        assert_eq!(Variant::Double(1.0).data_type(), Some(ids::DOUBLE));
        assert_eq!(
            Variant::Array(vec![Variant::Int32(1), Variant::Int32(2)]).data_type(),
            Some(ids::INT32)
        );
        assert_eq!(Variant::Empty.data_type(), None);
    }

    #[test]
    fn compatibility_rules() {
        assert!(Variant::Double(2.5).is_compatible_with(&ids::DOUBLE));
        assert!(!Variant::String("x".into()).is_compatible_with(&ids::DOUBLE));
        assert!(Variant::UInt16(4).is_compatible_with(&ids::NUMBER));
        assert!(!Variant::Boolean(true).is_compatible_with(&ids::NUMBER));
        assert!(Variant::Boolean(true).is_compatible_with(&ids::BASE_DATA_TYPE));
        assert!(Variant::Boolean(true).is_compatible_with(&NodeId::numeric(4, 3002)));
    }

    #[test]
    fn attribute_numbers_round_trip() {
        for id in [AttributeId::Value, AttributeId::AccessLevel, AttributeId::Executable] {
            assert_eq!(AttributeId::from_u32(id as u32), Some(id));
        }
        assert_eq!(AttributeId::from_u32(6), None);
    }

    #[test]
    fn display_arrays() {
        let v = Variant::Array(vec![Variant::Byte(1), Variant::Byte(2)]);
        assert_eq!(v.to_string(), "[1, 2]");
    }
}
