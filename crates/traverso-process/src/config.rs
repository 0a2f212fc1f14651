//! Traversal configuration.

/// How a traversal is going to be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// A single, sequential pull chain.
    #[default]
    Standard,
    /// Traversers are shipped between graph partitions.
    ///
    /// Only steps whose state can be linearized into messages are allowed.
    Partitioned,
}

/// Configuration options for a traversal.
///
/// Nested traversals (repeat bodies, predicate traversals) inherit the
/// configuration of the traversal they are attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalConfig {
    /// The execution mode.
    pub mode: ExecutionMode,
}

impl TraversalConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self { mode: ExecutionMode::Standard }
    }

    /// Sets the execution mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns `true` if traversers may cross partition boundaries.
    #[inline]
    #[must_use]
    pub const fn is_partitioned(&self) -> bool {
        matches!(self.mode, ExecutionMode::Partitioned)
    }
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self::new()
    }
}
