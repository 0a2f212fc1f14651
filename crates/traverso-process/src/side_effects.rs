//! The shared side-effect register.
//!
//! A [`SideEffects`] value is a handle: clones share one underlying map, so a
//! write through any handle is visible through all of them. A loop body and
//! the traversal that owns it hold handles to the same register.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;
use traverso_core::Value;

/// Handle to a side-effect register (key to value).
#[derive(Clone, Default)]
pub struct SideEffects {
    inner: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl SideEffects {
    /// Creates an empty register.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).insert(key.into(), value)
    }

    /// Appends `value` to the array stored under `key`.
    ///
    /// A missing key starts a new array; a non-array value is wrapped as the
    /// first element of a new array.
    pub fn append(&self, key: &str, value: Value) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let slot = map.entry(key.to_owned()).or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(items) => items.push(value),
            other => {
                let previous = std::mem::replace(other, Value::Null);
                *other = Value::Array(vec![previous, value]);
            }
        }
    }

    /// Returns `true` if a value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).contains_key(key)
    }

    /// Returns the stored keys in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect()
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if both handles point at the same register.
    #[must_use]
    pub fn same_register(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Copies every entry of this register into `target`.
    ///
    /// Keys already present in `target` keep the target's value.
    pub fn merge_into(&self, target: &Self) {
        if self.same_register(target) {
            return;
        }
        let entries = self.inner.read().unwrap_or_else(PoisonError::into_inner).clone();
        let mut map = target.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut merged = 0usize;
        for (key, value) in entries {
            if let std::collections::btree_map::Entry::Vacant(slot) = map.entry(key) {
                slot.insert(value);
                merged += 1;
            }
        }
        debug!(merged, total = map.len(), "merged side-effect register");
    }
}

impl fmt::Debug for SideEffects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("SideEffects").field("keys", &map.keys().collect::<Vec<_>>()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_register() {
        let a = SideEffects::new();
        let b = a.clone();
        a.set("x", Value::Int(1));
        assert_eq!(b.get("x"), Some(Value::Int(1)));
        assert!(a.same_register(&b));
        assert!(!a.same_register(&SideEffects::new()));
    }

    #[test]
    fn append_builds_arrays() {
        let se = SideEffects::new();
        se.append("seen", Value::Int(1));
        se.append("seen", Value::Int(2));
        assert_eq!(se.get("seen"), Some(Value::Array(vec![Value::Int(1), Value::Int(2)])));

        se.set("scalar", Value::from("a"));
        se.append("scalar", Value::from("b"));
        assert_eq!(se.get("scalar"), Some(Value::Array(vec![Value::from("a"), Value::from("b")])));
    }

    #[test]
    fn merge_keeps_target_values_on_conflict() {
        let child = SideEffects::new();
        child.set("shared", Value::Int(1));
        child.set("child_only", Value::Int(2));

        let parent = SideEffects::new();
        parent.set("shared", Value::Int(100));

        child.merge_into(&parent);
        assert_eq!(parent.get("shared"), Some(Value::Int(100)));
        assert_eq!(parent.get("child_only"), Some(Value::Int(2)));
        assert_eq!(parent.keys(), vec!["child_only".to_owned(), "shared".to_owned()]);
    }

    #[test]
    fn merge_into_self_is_a_no_op() {
        let se = SideEffects::new();
        se.set("k", Value::Null);
        se.merge_into(&se.clone());
        assert_eq!(se.len(), 1);
    }
}
