//! Adjacency fan-out.
//!
//! Maps each vertex traverser to one traverser per adjacent vertex.

use std::collections::VecDeque;

use traverso_core::{CoreError, Direction, Value};

use crate::bytecode::{Argument, Instruction};
use crate::error::ProcessResult;
use crate::step::{BoxedStep, Step, StepBase, StepInput};
use crate::traverser::Traverser;

/// Moves from a vertex to its neighbours.
///
/// The adjacent vertices of one input are buffered and drained before the
/// next input is pulled.
#[derive(Debug, Clone)]
pub struct VertexStep {
    base: StepBase,
    direction: Direction,
    labels: Vec<String>,
    pending: VecDeque<Traverser>,
}

impl VertexStep {
    /// The step name.
    pub const NAME: &'static str = "VertexStep";

    /// Creates a vertex step. Empty `labels` follows every edge.
    #[must_use]
    pub fn new(direction: Direction, labels: Vec<String>) -> Self {
        Self { base: StepBase::new(), direction, labels, pending: VecDeque::new() }
    }

    /// Returns the direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the edge labels followed.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Step for VertexStep {
    fn process_next(&mut self, input: &mut StepInput<'_>) -> ProcessResult<Option<Traverser>> {
        loop {
            if let Some(next) = self.pending.pop_front() {
                return Ok(Some(next));
            }
            let Some(traverser) = input.pull()? else {
                return Ok(None);
            };
            let vertex = traverser.value().as_vertex().ok_or_else(|| {
                CoreError::type_mismatch_with_value(
                    "vertex",
                    traverser.value().type_name(),
                    traverser.value(),
                )
            })?;
            for adjacent in input.graph().adjacent(vertex, self.direction, &self.labels)? {
                self.pending.push_back(traverser.split_with(Value::Vertex(adjacent)));
            }
        }
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
        let arguments =
            self.labels.iter().map(|label| Argument::Value(Value::from(label.as_str()))).collect();
        Ok(vec![Instruction::new(self.direction.operator(), arguments)])
    }

    fn duplicate(&self) -> BoxedStep {
        Box::new(Self {
            base: self.base.duplicate(),
            direction: self.direction,
            labels: self.labels.clone(),
            pending: self.pending.clone(),
        })
    }

    fn describe(&self) -> String {
        if self.labels.is_empty() {
            format!("{}({})", Self::NAME, self.direction)
        } else {
            format!("{}({},[{}])", Self::NAME, self.direction, self.labels.join(","))
        }
    }

    fn reset(&mut self) {
        self.pending.clear();
    }
}
