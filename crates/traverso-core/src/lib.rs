//! `Traverso` Core
//!
//! This crate provides the fundamental types shared by every layer of the
//! traversal engine.
//!
//! # Overview
//!
//! - **Identifiers**: [`VertexId`] and [`EdgeId`] for referencing graph elements
//! - **Values**: [`Value`], the opaque payload carried by traversers
//! - **Addressing**: [`ElementKind`] and [`ElementAddress`] for resolving a value
//!   against a partition in distributed execution
//! - **Encoding**: [`Encoder`](encoding::Encoder) / [`Decoder`](encoding::Decoder)
//!   for shipping data across a process boundary
//!
//! # Example
//!
//! ```
//! use traverso_core::{ElementAddress, ElementKind, Value, VertexId};
//!
//! let v = Value::Vertex(VertexId::new(7));
//! let address = ElementAddress::of(&v).unwrap();
//!
//! assert_eq!(address.kind, ElementKind::Vertex);
//! assert_eq!(address.element_id, 7);
//! ```
//!
//! # Modules
//!
//! - [`types`] - Core data types ([`Value`], IDs, addressing)
//! - [`encoding`] - Versioned wire encoding traits
//! - [`error`] - Error types ([`CoreError`])

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod encoding;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::CoreError;
pub use types::{Direction, EdgeId, ElementAddress, ElementKind, Value, VertexId};
