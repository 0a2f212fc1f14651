//! Closure map.

use std::fmt;
use std::sync::Arc;

use traverso_core::Value;

use crate::bytecode::{Argument, Instruction};
use crate::error::ProcessResult;
use crate::step::{BoxedStep, Step, StepBase, StepInput};
use crate::traverser::Traverser;

/// A value-to-value function.
pub type MapFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Replaces each traverser's value with the result of a closure.
///
/// Closures cannot cross the wire: the step encodes as a lambda argument,
/// which translation rejects.
#[derive(Clone)]
pub struct LambdaMapStep {
    base: StepBase,
    name: String,
    function: MapFn,
}

impl LambdaMapStep {
    /// The step name.
    pub const NAME: &'static str = "LambdaMapStep";

    /// Creates a map step. `name` identifies the closure in output and
    /// in bytecode.
    #[must_use]
    pub fn new<F>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self { base: StepBase::new(), name: name.into(), function: Arc::new(function) }
    }
}

impl fmt::Debug for LambdaMapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaMapStep").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Step for LambdaMapStep {
    fn process_next(&mut self, input: &mut StepInput<'_>) -> ProcessResult<Option<Traverser>> {
        Ok(input.pull()?.map(|t| {
            let mapped = (self.function)(t.value());
            t.split_with(mapped)
        }))
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
        Ok(vec![Instruction::new("map", vec![Argument::Lambda(self.name.clone())])])
    }

    fn duplicate(&self) -> BoxedStep {
        Box::new(Self {
            base: self.base.duplicate(),
            name: self.name.clone(),
            function: Arc::clone(&self.function),
        })
    }

    fn describe(&self) -> String {
        format!("{}(lambda:{})", Self::NAME, self.name)
    }
}
