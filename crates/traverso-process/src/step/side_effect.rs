//! Register writes and reads.

use std::collections::BTreeSet;

use traverso_core::Value;

use crate::bytecode::{Argument, Instruction};
use crate::error::ProcessResult;
use crate::step::{BoxedStep, Step, StepBase, StepInput};
use crate::traverser::{Traverser, TraverserRequirement};

/// Appends each value to an array in the side-effect register and passes
/// the traverser on.
///
/// A traverser with bulk `n` is appended `n` times.
#[derive(Debug, Clone)]
pub struct StoreStep {
    base: StepBase,
    key: String,
}

impl StoreStep {
    /// The step name.
    pub const NAME: &'static str = "StoreStep";

    /// Creates a store step writing to `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { base: StepBase::new(), key: key.into() }
    }

    /// Returns the register key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Step for StoreStep {
    fn process_next(&mut self, input: &mut StepInput<'_>) -> ProcessResult<Option<Traverser>> {
        let Some(traverser) = input.pull()? else {
            return Ok(None);
        };
        let side_effects = input.side_effects();
        for _ in 0..traverser.bulk() {
            side_effects.append(&self.key, traverser.value().clone());
        }
        Ok(Some(traverser))
    }

    fn base(&self) -> &StepBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StepBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn instructions(&self) -> ProcessResult<Vec<Instruction>> {
        Ok(vec![Instruction::new("store", vec![Argument::Value(Value::from(self.key.as_str()))])])
    }

    fn duplicate(&self) -> BoxedStep {
        Box::new(Self { base: self.base.duplicate(), key: self.key.clone() })
    }

    fn describe(&self) -> String {
        format!("{}({})", Self::NAME, self.key)
    }

    fn requirements(&self) -> BTreeSet<TraverserRequirement> {
        BTreeSet::from([TraverserRequirement::SideEffects])
    }

    fn side_effect_key(&self) -> Option<&str> {
        Some(&self.key)
    }
}

/// Drains its upstream, then emits the register value under a key once.
///
/// A missing key yields an empty array.
#[derive(Debug, Clone)]
pub struct CapStep {
    base: StepBase,
    key: String,
    done: bool,
}

impl CapStep {
    /// The step name.
    pub const NAME: &'static str = "CapStep";

    /// Creates a cap step reading `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { base: StepBase::new(), key: key.into(), done: false }
    }

    /// Returns the register key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Step for CapStep {
    fn process_next(&mut self, input: &mut StepInput<'_>) -> ProcessResult<Option<Traverser>> {
        if self.done {
            return Ok(None);
        }
        while input.pull()?.is_some() {}
        self.done = true;
        let value = input.side_effects().get(&self.key).unwrap_or_else(|| Value::Array(Vec::new()));
        Ok(Some(Traverser::new(value)))
    }

    fn base(&self) -> &StepBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StepBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn instructions(&self) -> ProcessResult<Vec<Instruction>> {
        Ok(vec![Instruction::new("cap", vec![Argument::Value(Value::from(self.key.as_str()))])])
    }

    fn duplicate(&self) -> BoxedStep {
        Box::new(Self { base: self.base.duplicate(), key: self.key.clone(), done: false })
    }

    fn describe(&self) -> String {
        format!("{}({})", Self::NAME, self.key)
    }

    fn reset(&mut self) {
        self.done = false;
    }

    fn requirements(&self) -> BTreeSet<TraverserRequirement> {
        BTreeSet::from([TraverserRequirement::SideEffects])
    }
}
