//! Traversal strategies.
//!
//! A strategy is a rewrite pass over a traversal's steps. Strategies run once,
//! in set order, when a traversal is prepared for its first pull.
//!
//! # Standard Strategies
//!
//! - **Identity Removal**: Drop unlabelled identity steps
//! - **Side-Effect Cap**: Return the register value of a trailing side-effect step
//!
//! Traversals nested in a loop stage get their parent's set with the
//! side-effect cap removed: a loop body must keep passing traversers on.
//!
//! # Example
//!
//! ```
//! use traverso_process::strategy::{SideEffectCapStrategy, TraversalStrategies};
//!
//! let nested = TraversalStrategies::standard().without(SideEffectCapStrategy::NAME);
//! assert!(!nested.contains(SideEffectCapStrategy::NAME));
//! ```

mod identity_removal;
mod side_effect_cap;

pub use identity_removal::IdentityRemovalStrategy;
pub use side_effect_cap::SideEffectCapStrategy;

use std::fmt;
use std::sync::Arc;

use crate::error::ProcessResult;
use crate::traversal::Traversal;

/// A rewrite pass over a traversal.
pub trait TraversalStrategy: Send + Sync {
    /// The strategy name. Sets hold at most one strategy per name.
    fn name(&self) -> &'static str;

    /// Rewrites `traversal` in place.
    ///
    /// # Errors
    ///
    /// Returns an error if a step cannot be inserted or removed.
    fn apply(&self, traversal: &mut Traversal) -> ProcessResult<()>;
}

/// An ordered set of strategies, keyed by name.
#[derive(Clone, Default)]
pub struct TraversalStrategies {
    strategies: Vec<Arc<dyn TraversalStrategy>>,
}

impl TraversalStrategies {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The set installed on traversals spawned from a source.
    #[must_use]
    pub fn standard() -> Self {
        Self::new().with(IdentityRemovalStrategy).with(SideEffectCapStrategy)
    }

    /// Adds a strategy, replacing any strategy with the same name in place.
    pub fn add(&mut self, strategy: impl TraversalStrategy + 'static) {
        let strategy: Arc<dyn TraversalStrategy> = Arc::new(strategy);
        match self.strategies.iter().position(|s| s.name() == strategy.name()) {
            Some(index) => self.strategies[index] = strategy,
            None => self.strategies.push(strategy),
        }
    }

    /// Builder form of [`add`](Self::add).
    #[must_use]
    pub fn with(mut self, strategy: impl TraversalStrategy + 'static) -> Self {
        self.add(strategy);
        self
    }

    /// Removes the strategy named `name`. Returns `true` if one was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.strategies.len();
        self.strategies.retain(|s| s.name() != name);
        self.strategies.len() != before
    }

    /// Returns a copy of this set without the strategy named `name`.
    #[must_use]
    pub fn without(&self, name: &str) -> Self {
        let mut copy = self.clone();
        copy.remove(name);
        copy
    }

    /// Returns `true` if a strategy named `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.strategies.iter().any(|s| s.name() == name)
    }

    /// Returns the strategy names in application order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Returns the number of strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Iterates the strategies in application order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn TraversalStrategy>> {
        self.strategies.iter()
    }
}

impl fmt::Debug for TraversalStrategies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl fmt::Display for TraversalStrategies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl TraversalStrategy for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn apply(&self, _traversal: &mut Traversal) -> ProcessResult<()> {
            Ok(())
        }
    }

    #[test]
    fn standard_set() {
        let set = TraversalStrategies::standard();
        assert_eq!(set.names(), vec![IdentityRemovalStrategy::NAME, SideEffectCapStrategy::NAME]);
    }

    #[test]
    fn without_leaves_original_untouched() {
        let set = TraversalStrategies::standard();
        let nested = set.without(SideEffectCapStrategy::NAME);
        assert!(set.contains(SideEffectCapStrategy::NAME));
        assert!(!nested.contains(SideEffectCapStrategy::NAME));
        assert_eq!(nested.len(), 1);
    }

    #[test]
    fn add_replaces_by_name() {
        let mut set = TraversalStrategies::new().with(Named("a")).with(Named("b"));
        set.add(Named("a"));
        assert_eq!(set.names(), vec!["a", "b"]);
        assert!(set.remove("a"));
        assert!(!set.remove("a"));
        assert_eq!(set.to_string(), "[b]");
    }
}
