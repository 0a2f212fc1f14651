//! `Traverso` Process
//!
//! This crate provides the pull-based execution core of the traversal
//! engine: traversers, steps, traversals, loop control with
//! `repeat` / `until` / `emit`, strategies, and the bytecode wire form.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use traverso_core::{Value, VertexId};
//! use traverso_process::{MemoryGraph, Traversal, TraversalSource};
//!
//! let mut graph = MemoryGraph::new();
//! let (a, b, c) = (graph.add_vertex(1u64), graph.add_vertex(2u64), graph.add_vertex(3u64));
//! graph.add_edge(a, b, "next").unwrap();
//! graph.add_edge(b, c, "next").unwrap();
//!
//! let g = TraversalSource::new(Arc::new(graph));
//! let mut walk = g
//!     .v([VertexId::new(1)])
//!     .unwrap()
//!     .repeat(Traversal::anonymous().out(&["next"]).unwrap())
//!     .unwrap()
//!     .times(2)
//!     .unwrap();
//!
//! assert_eq!(walk.values().unwrap(), vec![Value::Vertex(VertexId::new(3))]);
//! ```
//!
//! # Modules
//!
//! - [`traverser`] - The unit of flow ([`Traverser`])
//! - [`step`] - The [`Step`] trait and the step catalog, including [`RepeatStep`]
//! - [`predicate`] - Loop-exit and emit conditions ([`RepeatPredicate`])
//! - [`traversal`] - Pipelines and the fluent builder ([`Traversal`])
//! - [`source`] - Traversal sources ([`TraversalSource`])
//! - [`strategy`] - Rewrite passes run before the first pull
//! - [`side_effects`] - The shared side-effect register
//! - [`graph`] - Graph access for steps
//! - [`bytecode`] - Wire form and translation back to traversals
//! - [`message`] - Traversers in transit between partitions
//! - [`config`] - Traversal configuration
//! - [`error`] - Error types

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod bytecode;
pub mod config;
pub mod error;
pub mod graph;
pub mod message;
pub mod predicate;
pub mod side_effects;
pub mod source;
pub mod step;
pub mod strategy;
pub mod traversal;
pub mod traverser;

// Re-export commonly used types
pub use bytecode::{Argument, Bytecode, Instruction, Translator};
pub use config::{ExecutionMode, TraversalConfig};
pub use error::{ProcessError, ProcessResult};
pub use graph::{GraphAccessError, GraphAccessor, MemoryGraph, NullGraphAccessor};
pub use message::TraverserMessage;
pub use predicate::{LoopsPredicate, RepeatPredicate, TraversalPredicate};
pub use side_effects::SideEffects;
pub use source::TraversalSource;
pub use step::{BoxedStep, Compare, CompareOp, LoopStats, RepeatStep, Step, StepBase, StepInput};
pub use strategy::{TraversalStrategies, TraversalStrategy};
pub use traversal::{NestedScope, Traversal};
pub use traverser::{Traverser, TraverserRequirement};
