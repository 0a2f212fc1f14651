//! Core data types for `Traverso`.
//!
//! This module defines the values carried through a traversal and the
//! identifiers and addresses of the graph elements they refer to.

mod element;
mod id;
mod value;

pub use element::{Direction, ElementAddress, ElementKind};
pub use id::{EdgeId, VertexId};
pub use value::Value;
