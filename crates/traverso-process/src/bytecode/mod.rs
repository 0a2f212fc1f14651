//! Bytecode: the wire form of a traversal.
//!
//! A traversal is encoded as the instructions that would rebuild it through
//! the builder: source instructions (`inject`, `V`) followed by step
//! instructions (`out`, `repeat`, `until`, `as`, ...). Nested traversals
//! (loop bodies, traversal predicates) are nested bytecode arguments.
//!
//! Bytecode is encoded as JSON behind the core format-version byte.
//! [`Translator`] turns it back into an executable traversal.

mod translator;

pub use translator::Translator;

use serde::{Deserialize, Serialize};
use traverso_core::encoding::{decode_json, encode_json, Decoder, Encoder};
use traverso_core::{CoreError, Value};

use crate::step::Compare;

/// An instruction argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Argument {
    /// A plain value (start values, keys, labels).
    Value(Value),
    /// A comparison for `is`.
    Compare(Compare),
    /// A loop-count predicate.
    Loops {
        /// The threshold.
        max_loops: u32,
        /// The loop label, if not the enclosing loop.
        label: Option<String>,
    },
    /// A nested traversal.
    Bytecode(Bytecode),
    /// A closure, by description. Never translatable.
    Lambda(String),
}

/// One builder call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The builder operation.
    pub operator: String,
    /// Its arguments.
    pub arguments: Vec<Argument>,
}

impl Instruction {
    /// Creates an instruction.
    #[must_use]
    pub fn new(operator: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self { operator: operator.into(), arguments }
    }
}

/// The wire form of a traversal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bytecode {
    /// Instructions that create the traversal and its starts.
    pub source_instructions: Vec<Instruction>,
    /// Instructions that append steps.
    pub step_instructions: Vec<Instruction>,
}

impl Bytecode {
    /// Returns `true` if there are no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source_instructions.is_empty() && self.step_instructions.is_empty()
    }

    /// Returns the description of the first lambda argument, searching
    /// nested bytecode too.
    #[must_use]
    pub fn find_lambda(&self) -> Option<&str> {
        self.source_instructions
            .iter()
            .chain(&self.step_instructions)
            .flat_map(|instruction| &instruction.arguments)
            .find_map(|argument| match argument {
                Argument::Lambda(description) => Some(description.as_str()),
                Argument::Bytecode(nested) => nested.find_lambda(),
                _ => None,
            })
    }
}

impl Encoder for Bytecode {
    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<(), CoreError> {
        encode_json(self, buf)
    }
}

impl Decoder for Bytecode {
    fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        decode_json(bytes)
    }
}
