//! Values carried by traversers.
//!
//! The traversal engine treats a [`Value`] as opaque: steps may inspect it
//! (a vertex step needs a vertex, a filter needs something comparable), but
//! the pipeline and loop machinery only move it around.
//!
//! # Example
//!
//! ```
//! use traverso_core::Value;
//!
//! let name: Value = "marko".into();
//! let age: Value = 29i64.into();
//!
//! assert_eq!(name.as_str(), Some("marko"));
//! assert_eq!(age.as_int(), Some(29));
//! assert!(Value::Int(3) < Value::Float(3.5));
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};

use super::{EdgeId, VertexId};

/// A value flowing through a traversal.
///
/// | Variant | Use Case |
/// |---------|----------|
/// | `Null` | Missing values |
/// | `Bool`, `Int`, `Float`, `String` | Scalars |
/// | `Vertex` | A reference to a graph vertex |
/// | `Edge` | A graph edge with its endpoints |
/// | `Property` | A keyed property of a vertex or edge |
/// | `Array` | Collected values (e.g. side-effect stores) |
///
/// `Int` and `Float` are compared numerically, by both `==` and ordering, so
/// `Value::Int(2) == Value::Float(2.0)`. Only finite floats can be encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Null/missing value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(#[serde(serialize_with = "serialize_finite")] f64),
    /// UTF-8 string
    String(String),
    /// Reference to a vertex
    Vertex(VertexId),
    /// A graph edge.
    Edge {
        /// The edge ID
        id: EdgeId,
        /// The edge label
        label: String,
        /// Outgoing (source) vertex
        source: VertexId,
        /// Incoming (target) vertex
        target: VertexId,
    },
    /// A property attached to a vertex.
    Property {
        /// The vertex that owns the property
        owner: VertexId,
        /// The property key
        key: String,
        /// The property value
        value: Box<Value>,
    },
    /// Array of values
    Array(Vec<Value>),
}

impl Value {
    /// Returns `true` if the value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as a boolean if it is one.
    #[inline]
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an integer if it is one.
    #[inline]
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float if it is one.
    #[inline]
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as a string slice if it is one.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the vertex ID if the value is a vertex.
    #[inline]
    #[must_use]
    pub const fn as_vertex(&self) -> Option<VertexId> {
        match self {
            Self::Vertex(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the value as an array slice if it is one.
    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the name of this value's type, for error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Vertex(_) => "vertex",
            Self::Edge { .. } => "edge",
            Self::Property { .. } => "property",
            Self::Array(_) => "array",
        }
    }

    /// Creates an edge value from its components.
    #[must_use]
    pub fn edge(id: EdgeId, label: impl Into<String>, source: VertexId, target: VertexId) -> Self {
        Self::Edge { id, label: label.into(), source, target }
    }

    /// Creates a property value from its components.
    #[must_use]
    pub fn property(owner: VertexId, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Property { owner, key: key.into(), value: Box::new(value.into()) }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_finite<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        Err(S::Error::custom(format!("non-finite float {value} cannot be encoded")))
    }
}

impl PartialEq for Value {
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => *a as f64 == *b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Vertex(a), Self::Vertex(b)) => a == b,
            (
                Self::Edge { id: a, label: la, source: sa, target: ta },
                Self::Edge { id: b, label: lb, source: sb, target: tb },
            ) => a == b && la == lb && sa == sb && ta == tb,
            (
                Self::Property { owner: a, key: ka, value: va },
                Self::Property { owner: b, key: kb, value: vb },
            ) => a == b && ka == kb && va == vb,
            (Self::Array(a), Self::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    /// Numbers compare numerically across `Int` and `Float`; strings and
    /// booleans compare within their own type. Other values are only ordered
    /// against an equal value.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => (self == other).then_some(Ordering::Equal),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
            Self::Vertex(id) => write!(f, "{id}"),
            Self::Edge { id, label, source, target } => {
                write!(f, "{id}[{}-{label}->{}]", source.as_u64(), target.as_u64())
            }
            Self::Property { key, value, .. } => write!(f, "p[{key}->{value}]"),
            Self::Array(items) => {
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

impl From<bool> for Value {
    #[inline]
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    #[inline]
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<VertexId> for Value {
    #[inline]
    fn from(id: VertexId) -> Self {
        Self::Vertex(id)
    }
}

impl From<Vec<Value>> for Value {
    #[inline]
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}
