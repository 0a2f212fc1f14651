//! Graph element kinds, directions and stable addresses.
//!
//! When a traversal runs across partitioned graph data, a traverser that
//! moves to another partition carries an [`ElementAddress`] instead of the
//! element itself. The receiving partition resolves the address locally.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Value, VertexId};
use crate::CoreError;

/// The direction an edge is followed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Follow edges from source to target.
    Out,
    /// Follow edges from target to source.
    In,
    /// Follow edges either way.
    Both,
}

impl Direction {
    /// Returns the operator name used for this direction in bytecode.
    #[must_use]
    pub const fn operator(self) -> &'static str {
        match self {
            Self::Out => "out",
            Self::In => "in",
            Self::Both => "both",
        }
    }

    /// Parses a bytecode operator name back into a direction.
    #[must_use]
    pub fn from_operator(operator: &str) -> Option<Self> {
        match operator {
            "out" => Some(Self::Out),
            "in" => Some(Self::In),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Out => f.write_str("OUT"),
            Self::In => f.write_str("IN"),
            Self::Both => f.write_str("BOTH"),
        }
    }
}

/// The kind of graph element a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// A vertex.
    Vertex,
    /// An edge.
    Edge,
    /// A vertex property.
    Property,
}

impl ElementKind {
    /// Determines the element kind of a value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownElement`] if the value is not a graph element.
    pub fn of(value: &Value) -> Result<Self, CoreError> {
        match value {
            Value::Vertex(_) => Ok(Self::Vertex),
            Value::Edge { .. } => Ok(Self::Edge),
            Value::Property { .. } => Ok(Self::Property),
            other => Err(CoreError::UnknownElement(other.type_name().to_owned())),
        }
    }
}

/// A stable, partition-independent reference to a graph element.
///
/// Properties are addressed through the element that owns them plus the
/// property key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementAddress {
    /// The kind of element.
    pub kind: ElementKind,
    /// The element ID (the owner's ID for properties).
    pub element_id: u64,
    /// The property key, for property addresses.
    pub property_key: Option<String>,
}

impl ElementAddress {
    /// Builds the address of a value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownElement`] if the value is not a graph element.
    pub fn of(value: &Value) -> Result<Self, CoreError> {
        let kind = ElementKind::of(value)?;
        let (element_id, property_key) = match value {
            Value::Edge { id, .. } => (id.as_u64(), None),
            Value::Property { owner, key, .. } => (owner.as_u64(), Some(key.clone())),
            other => (other.as_vertex().map_or(0, VertexId::as_u64), None),
        };
        Ok(Self { kind, element_id, property_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EdgeId;

    #[test]
    fn address_of_vertex() {
        let addr = ElementAddress::of(&Value::Vertex(VertexId::new(1))).unwrap();
        assert_eq!(addr, ElementAddress { kind: ElementKind::Vertex, element_id: 1, property_key: None });
    }

    #[test]
    fn address_of_edge() {
        let edge = Value::edge(EdgeId::new(12), "knows", VertexId::new(1), VertexId::new(2));
        let addr = ElementAddress::of(&edge).unwrap();
        assert_eq!(addr.kind, ElementKind::Edge);
        assert_eq!(addr.element_id, 12);
    }

    #[test]
    fn address_of_property_uses_owner_and_key() {
        let prop = Value::property(VertexId::new(4), "name", "josh");
        let addr = ElementAddress::of(&prop).unwrap();
        assert_eq!(addr.kind, ElementKind::Property);
        assert_eq!(addr.element_id, 4);
        assert_eq!(addr.property_key.as_deref(), Some("name"));
    }

    #[test]
    fn scalars_are_not_addressable() {
        let err = ElementAddress::of(&Value::Int(3)).unwrap_err();
        assert!(matches!(err, CoreError::UnknownElement(ref t) if t == "int"));
    }

    #[test]
    fn direction_operator_names() {
        for dir in [Direction::Out, Direction::In, Direction::Both] {
            assert_eq!(Direction::from_operator(dir.operator()), Some(dir));
        }
        assert_eq!(Direction::from_operator("sideways"), None);
    }
}
