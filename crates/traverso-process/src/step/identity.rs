//! Pass-through step.

use crate::bytecode::Instruction;
use crate::error::ProcessResult;
use crate::step::{BoxedStep, Step, StepBase, StepInput};
use crate::traverser::Traverser;

/// Emits every upstream traverser unchanged.
#[derive(Debug, Clone, Default)]
pub struct IdentityStep {
    base: StepBase,
}

impl IdentityStep {
    /// The step name.
    pub const NAME: &'static str = "IdentityStep";

    /// Creates an identity step.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Step for IdentityStep {
    fn process_next(&mut self, input: &mut StepInput<'_>) -> ProcessResult<Option<Traverser>> {
        input.pull()
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
        Ok(vec![Instruction::new("identity", Vec::new())])
    }

    fn duplicate(&self) -> BoxedStep {
        Box::new(Self { base: self.base.duplicate() })
    }
}
