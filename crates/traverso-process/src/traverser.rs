//! The unit of flow through a traversal.
//!
//! A [`Traverser`] carries a [`Value`], a bulk (how many identical logical
//! traversers it stands for) and one loop counter per loop label.

use std::collections::BTreeMap;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use traverso_core::Value;

use crate::error::{ProcessError, ProcessResult};

/// Capabilities a traversal needs from its traversers.
///
/// Steps declare these so an enclosing traversal knows which traverser
/// fields must be tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TraverserRequirement {
    /// Bulk must be carried through splits and merges.
    Bulk,
    /// A loop counter is read and written.
    SingleLoop,
    /// Loop counters of nested loops must be kept apart.
    NestedLoop,
    /// The traversal writes to or reads from the side-effect register.
    SideEffects,
}

/// A traverser: a value plus bulk and loop bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traverser {
    value: Value,
    bulk: NonZeroU64,
    loops: BTreeMap<String, u32>,
}

impl Traverser {
    /// Creates a traverser with a bulk of one and no loop history.
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self { value: value.into(), bulk: NonZeroU64::MIN, loops: BTreeMap::new() }
    }

    /// Sets the bulk.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] if `bulk` is zero.
    pub fn with_bulk(mut self, bulk: u64) -> ProcessResult<Self> {
        self.set_bulk(bulk)?;
        Ok(self)
    }

    /// Returns the carried value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the traverser and returns its value.
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Returns the bulk.
    #[inline]
    #[must_use]
    pub fn bulk(&self) -> u64 {
        self.bulk.get()
    }

    /// Replaces the bulk.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] if `bulk` is zero.
    pub fn set_bulk(&mut self, bulk: u64) -> ProcessResult<()> {
        self.bulk = NonZeroU64::new(bulk)
            .ok_or_else(|| ProcessError::invariant("traverser bulk must be positive"))?;
        Ok(())
    }

    /// Returns the loop count for `label`, zero if the label was never counted.
    #[inline]
    #[must_use]
    pub fn loops(&self, label: &str) -> u32 {
        self.loops.get(label).copied().unwrap_or(0)
    }

    /// Returns all loop counters.
    #[must_use]
    pub fn loop_counters(&self) -> &BTreeMap<String, u32> {
        &self.loops
    }

    /// Increments the loop count for `label`.
    pub fn incr_loops(&mut self, label: &str) {
        *self.loops.entry(label.to_owned()).or_insert(0) += 1;
    }

    /// Resets the loop count for `label` to zero.
    pub fn reset_loops(&mut self, label: &str) {
        self.loops.remove(label);
    }

    /// Forks this traverser.
    ///
    /// The fork has the same value, bulk and loop counters but is an
    /// independent traverser: changes to one never affect the other.
    #[must_use]
    pub fn split(&self) -> Self {
        self.clone()
    }

    /// Forks this traverser with a new value.
    #[must_use]
    pub fn split_with(&self, value: impl Into<Value>) -> Self {
        Self { value: value.into(), bulk: self.bulk, loops: self.loops.clone() }
    }

    pub(crate) fn from_parts(value: Value, bulk: NonZeroU64, loops: BTreeMap<String, u32>) -> Self {
        Self { value, bulk, loops }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_traverser_has_unit_bulk_and_no_loops() {
        let t = Traverser::new(5i64);
        assert_eq!(t.bulk(), 1);
        assert_eq!(t.loops("anything"), 0);
        assert!(t.loop_counters().is_empty());
    }

    #[test]
    fn zero_bulk_is_rejected() {
        let err = Traverser::new(1i64).with_bulk(0).unwrap_err();
        assert!(matches!(err, ProcessError::InvariantViolation(_)));
    }

    #[test]
    fn loop_counters_are_per_label() {
        let mut t = Traverser::new("x");
        t.incr_loops("a");
        t.incr_loops("a");
        t.incr_loops("b");
        assert_eq!(t.loops("a"), 2);
        assert_eq!(t.loops("b"), 1);

        t.reset_loops("a");
        assert_eq!(t.loops("a"), 0);
        assert_eq!(t.loops("b"), 1);
    }

    #[test]
    fn split_is_independent() {
        let mut original = Traverser::new("x").with_bulk(3).unwrap();
        original.incr_loops("r");

        let mut fork = original.split();
        assert_eq!(fork, original);

        fork.reset_loops("r");
        fork.set_bulk(1).unwrap();
        assert_eq!(original.loops("r"), 1);
        assert_eq!(original.bulk(), 3);
    }

    #[test]
    fn split_with_keeps_bookkeeping() {
        let mut t = Traverser::new(1i64).with_bulk(4).unwrap();
        t.incr_loops("r");
        let mapped = t.split_with(2i64);
        assert_eq!(mapped.value(), &Value::Int(2));
        assert_eq!(mapped.bulk(), 4);
        assert_eq!(mapped.loops("r"), 1);
    }
}
