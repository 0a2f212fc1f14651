//! Bytecode to traversal translation.

use tracing::debug;
use traverso_core::encoding::{Decoder, Encoder};
use traverso_core::{Direction, Value};

use crate::bytecode::{Argument, Bytecode, Instruction};
use crate::error::{ProcessError, ProcessResult};
use crate::predicate::RepeatPredicate;
use crate::source::TraversalSource;
use crate::traversal::Traversal;
use crate::traverser::Traverser;

/// Rebuilds traversals from bytecode against a traversal source.
///
/// Closures cannot cross the wire: bytecode holding a lambda argument
/// anywhere, nested bytecode included, is rejected as a whole.
#[derive(Debug, Clone)]
pub struct Translator {
    source: TraversalSource,
}

impl Translator {
    /// Creates a translator whose traversals are spawned from `source`.
    #[must_use]
    pub fn new(source: TraversalSource) -> Self {
        Self { source }
    }

    /// Returns the source translated traversals are spawned from.
    #[must_use]
    pub fn source(&self) -> &TraversalSource {
        &self.source
    }

    /// Builds an executable traversal from `bytecode`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::UnsupportedOperation`] for lambda arguments,
    /// unknown operators and malformed arguments, and any error the builder
    /// raises while attaching steps.
    pub fn translate(&self, bytecode: &Bytecode) -> ProcessResult<Traversal> {
        reject_lambdas(bytecode)?;
        let mut traversal = self.source.traversal();
        for instruction in &bytecode.source_instructions {
            self.apply_source(&mut traversal, instruction)?;
        }
        let traversal = self.apply_steps(traversal, &bytecode.step_instructions)?;
        debug!(
            source = bytecode.source_instructions.len(),
            steps = bytecode.step_instructions.len(),
            "translated bytecode"
        );
        Ok(traversal)
    }

    /// Ships `traversal` across a simulated process boundary: encode,
    /// decode, translate.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::UnsupportedOperation`] before encoding if the
    /// traversal holds a closure, plus any error of the individual stages.
    pub fn round_trip(&self, traversal: &Traversal) -> ProcessResult<Traversal> {
        let bytecode = traversal.bytecode()?;
        reject_lambdas(&bytecode)?;
        let bytes = bytecode.encode()?;
        self.translate(&Bytecode::decode(&bytes)?)
    }

    fn nested(&self, bytecode: &Bytecode) -> ProcessResult<Traversal> {
        if !bytecode.source_instructions.is_empty() {
            return Err(ProcessError::unsupported(
                "nested traversals cannot carry source instructions",
            ));
        }
        self.apply_steps(Traversal::anonymous(), &bytecode.step_instructions)
    }

    fn apply_source(&self, traversal: &mut Traversal, instruction: &Instruction) -> ProcessResult<()> {
        let starts = match instruction.operator.as_str() {
            "inject" => instruction
                .arguments
                .iter()
                .map(|argument| match argument {
                    Argument::Value(value) => Ok(Traverser::new(value.clone())),
                    _ => Err(malformed(instruction)),
                })
                .collect::<ProcessResult<Vec<_>>>()?,
            "V" => {
                let ids = instruction
                    .arguments
                    .iter()
                    .map(|argument| match argument {
                        Argument::Value(Value::Vertex(id)) => Ok(*id),
                        _ => Err(malformed(instruction)),
                    })
                    .collect::<ProcessResult<Vec<_>>>()?;
                self.source.vertex_starts(ids)?
            }
            other => {
                return Err(ProcessError::unsupported(format!("unknown source operator: {other}")))
            }
        };
        traversal.push_source(instruction.clone(), starts);
        Ok(())
    }

    fn apply_steps(
        &self,
        mut traversal: Traversal,
        instructions: &[Instruction],
    ) -> ProcessResult<Traversal> {
        for instruction in instructions {
            traversal = self.apply_step(traversal, instruction)?;
        }
        Ok(traversal)
    }

    fn apply_step(&self, traversal: Traversal, instruction: &Instruction) -> ProcessResult<Traversal> {
        let operator = instruction.operator.as_str();
        match (operator, instruction.arguments.as_slice()) {
            ("identity", []) => traversal.identity(),
            ("out" | "in" | "both", arguments) => {
                let direction = Direction::from_operator(operator)
                    .ok_or_else(|| malformed(instruction))?;
                let labels = arguments
                    .iter()
                    .map(|argument| match argument {
                        Argument::Value(Value::String(label)) => Ok(label.clone()),
                        _ => Err(malformed(instruction)),
                    })
                    .collect::<ProcessResult<Vec<_>>>()?;
                traversal.vertex(direction, labels)
            }
            ("is", [Argument::Compare(compare)]) => traversal.is(compare.clone()),
            ("store", [Argument::Value(Value::String(key))]) => traversal.store(key.as_str()),
            ("cap", [Argument::Value(Value::String(key))]) => traversal.cap(key.as_str()),
            ("as", [Argument::Value(Value::String(label))]) => traversal.as_(label.as_str()),
            ("repeat", [Argument::Bytecode(body)]) => traversal.repeat(self.nested(body)?),
            ("until", [argument]) => traversal.until(self.predicate(argument, instruction)?),
            ("emit", [argument]) => traversal.emit(self.predicate(argument, instruction)?),
            ("identity" | "is" | "store" | "cap" | "as" | "repeat" | "until" | "emit", _) => {
                Err(malformed(instruction))
            }
            (other, _) => Err(ProcessError::unsupported(format!("unknown operator: {other}"))),
        }
    }

    fn predicate(
        &self,
        argument: &Argument,
        instruction: &Instruction,
    ) -> ProcessResult<RepeatPredicate> {
        match argument {
            Argument::Loops { max_loops, label: Some(label) } => {
                Ok(RepeatPredicate::loops_of(label.clone(), *max_loops))
            }
            Argument::Loops { max_loops, label: None } => Ok(RepeatPredicate::loops(*max_loops)),
            Argument::Bytecode(bytecode) => Ok(RepeatPredicate::traversal(self.nested(bytecode)?)),
            _ => Err(malformed(instruction)),
        }
    }
}

fn reject_lambdas(bytecode: &Bytecode) -> ProcessResult<()> {
    match bytecode.find_lambda() {
        Some(lambda) => Err(ProcessError::unsupported(format!(
            "lambdas cannot be sent across the wire: {lambda}"
        ))),
        None => Ok(()),
    }
}

fn malformed(instruction: &Instruction) -> ProcessError {
    ProcessError::unsupported(format!("malformed arguments for {}", instruction.operator))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> Translator {
        Translator::new(TraversalSource::empty())
    }

    #[test]
    fn unknown_operator_is_unsupported() {
        let bytecode = Bytecode {
            source_instructions: Vec::new(),
            step_instructions: vec![Instruction::new("teleport", Vec::new())],
        };
        let err = translator().translate(&bytecode).unwrap_err();
        assert!(matches!(err, ProcessError::UnsupportedOperation(_)));
    }

    #[test]
    fn malformed_arguments_are_unsupported() {
        let bytecode = Bytecode {
            source_instructions: Vec::new(),
            step_instructions: vec![Instruction::new("store", vec![Argument::Value(Value::Int(1))])],
        };
        let err = translator().translate(&bytecode).unwrap_err();
        assert!(matches!(err, ProcessError::UnsupportedOperation(_)));
    }

    #[test]
    fn nested_source_instructions_are_rejected() {
        let nested = Bytecode {
            source_instructions: vec![Instruction::new("inject", Vec::new())],
            step_instructions: Vec::new(),
        };
        let bytecode = Bytecode {
            source_instructions: Vec::new(),
            step_instructions: vec![Instruction::new("repeat", vec![Argument::Bytecode(nested)])],
        };
        assert!(translator().translate(&bytecode).is_err());
    }

    #[test]
    fn inject_restores_starts() {
        let bytecode = Bytecode {
            source_instructions: vec![Instruction::new(
                "inject",
                vec![Argument::Value(Value::Int(1)), Argument::Value(Value::Int(2))],
            )],
            step_instructions: Vec::new(),
        };
        let mut traversal = translator().translate(&bytecode).unwrap();
        assert_eq!(traversal.values().unwrap(), vec![Value::Int(1), Value::Int(2)]);
    }
}
