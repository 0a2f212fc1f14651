//! Comparison filter.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use traverso_core::Value;

use crate::bytecode::{Argument, Instruction};
use crate::error::ProcessResult;
use crate::step::{BoxedStep, Step, StepBase, StepInput};
use crate::traverser::Traverser;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// Equal.
    Eq,
    /// Not equal.
    Neq,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
}

impl CompareOp {
    /// Returns the operator name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
        }
    }
}

/// A comparison against a fixed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compare {
    /// The operator.
    pub op: CompareOp,
    /// The right-hand operand.
    pub value: Value,
}

impl Compare {
    /// Creates a comparison.
    #[must_use]
    pub fn new(op: CompareOp, value: impl Into<Value>) -> Self {
        Self { op, value: value.into() }
    }

    /// `== value`
    #[must_use]
    pub fn eq(value: impl Into<Value>) -> Self {
        Self::new(CompareOp::Eq, value)
    }

    /// `!= value`
    #[must_use]
    pub fn neq(value: impl Into<Value>) -> Self {
        Self::new(CompareOp::Neq, value)
    }

    /// `< value`
    #[must_use]
    pub fn lt(value: impl Into<Value>) -> Self {
        Self::new(CompareOp::Lt, value)
    }

    /// `<= value`
    #[must_use]
    pub fn lte(value: impl Into<Value>) -> Self {
        Self::new(CompareOp::Lte, value)
    }

    /// `> value`
    #[must_use]
    pub fn gt(value: impl Into<Value>) -> Self {
        Self::new(CompareOp::Gt, value)
    }

    /// `>= value`
    #[must_use]
    pub fn gte(value: impl Into<Value>) -> Self {
        Self::new(CompareOp::Gte, value)
    }

    /// Tests `candidate` against the operand.
    ///
    /// Values that cannot be ordered against each other only satisfy `neq`.
    #[must_use]
    pub fn test(&self, candidate: &Value) -> bool {
        let ordering = candidate.partial_cmp(&self.value);
        match self.op {
            CompareOp::Eq => ordering == Some(Ordering::Equal),
            CompareOp::Neq => ordering != Some(Ordering::Equal),
            CompareOp::Lt => ordering == Some(Ordering::Less),
            CompareOp::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            CompareOp::Gt => ordering == Some(Ordering::Greater),
            CompareOp::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

impl fmt::Display for Compare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.op.as_str(), self.value)
    }
}

/// Keeps traversers whose value satisfies a comparison.
#[derive(Debug, Clone)]
pub struct IsStep {
    base: StepBase,
    compare: Compare,
}

impl IsStep {
    /// The step name.
    pub const NAME: &'static str = "IsStep";

    /// Creates a filter step.
    #[must_use]
    pub fn new(compare: Compare) -> Self {
        Self { base: StepBase::new(), compare }
    }

    /// Returns the comparison.
    #[must_use]
    pub fn compare(&self) -> &Compare {
        &self.compare
    }
}

impl Step for IsStep {
    fn process_next(&mut self, input: &mut StepInput<'_>) -> ProcessResult<Option<Traverser>> {
        while let Some(traverser) = input.pull()? {
            if self.compare.test(traverser.value()) {
                return Ok(Some(traverser));
            }
        }
        Ok(None)
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
        Ok(vec![Instruction::new("is", vec![Argument::Compare(self.compare.clone())])])
    }

    fn duplicate(&self) -> BoxedStep {
        Box::new(Self { base: self.base.duplicate(), compare: self.compare.clone() })
    }

    fn describe(&self) -> String {
        format!("{}({})", Self::NAME, self.compare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_numbers_across_types() {
        assert!(Compare::gt(2i64).test(&Value::Float(2.5)));
        assert!(Compare::lte(3i64).test(&Value::Int(3)));
        assert!(!Compare::lt(3i64).test(&Value::Int(3)));
        assert!(Compare::eq(1.0).test(&Value::Int(1)));
    }

    #[test]
    fn incomparable_values_only_pass_neq() {
        let text = Value::from("a");
        assert!(!Compare::eq(1i64).test(&text));
        assert!(!Compare::gt(1i64).test(&text));
        assert!(Compare::neq(1i64).test(&text));
    }

    #[test]
    fn display() {
        assert_eq!(Compare::gte(10i64).to_string(), "gte(10)");
    }
}
