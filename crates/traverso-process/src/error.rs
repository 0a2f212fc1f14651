//! Error types for traversal construction and execution.
//!
//! Exhaustion is not an error: a step that has nothing more to produce
//! returns `Ok(None)`.

use thiserror::Error;
use traverso_core::CoreError;

use crate::graph::GraphAccessError;

/// Errors that can occur while building or running a traversal.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The traversal is configured in a way that cannot execute.
    ///
    /// Raised before iteration starts, never mid-iteration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A structural invariant of the pipeline was broken by the caller.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The operation is not supported, e.g. shipping a lambda across the
    /// wire boundary.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A graph access failed.
    #[error(transparent)]
    Graph(#[from] GraphAccessError),

    /// A core type or encoding error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ProcessError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an invariant violation error.
    #[must_use]
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Creates an unsupported operation error.
    #[must_use]
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }
}

/// Result type for traversal operations.
pub type ProcessResult<T> = Result<T, ProcessError>;
