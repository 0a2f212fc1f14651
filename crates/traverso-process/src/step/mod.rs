//! Step trait and base types.
//!
//! This module defines the [`Step`] trait that every pipeline stage
//! implements, and [`StepInput`], the pull handle a step uses to reach its
//! upstream.
//!
//! # Pull protocol
//!
//! A traversal asks its last step for the next traverser. That step pulls
//! from the step before it through [`StepInput::pull`], and so on down to
//! the traversal's start buffer. `Ok(None)` means "nothing more right now";
//! it is repeated on every further pull until new starts are fed into the
//! traversal.
//!
//! # Step Categories
//!
//! - [`identity`] - Pass-through
//! - [`vertex`] - Adjacency fan-out (`out`, `in`, `both`)
//! - [`filter`] - Comparison filter (`is`)
//! - [`map`] - Closure map
//! - [`side_effect`] - Register writes (`store`) and reads (`cap`)
//! - [`repeat`] - Loop control (`repeat` / `until` / `emit`)

use std::collections::{BTreeSet, VecDeque};

use crate::bytecode::Instruction;
use crate::config::TraversalConfig;
use crate::error::ProcessResult;
use crate::graph::GraphAccessor;
use crate::side_effects::SideEffects;
use crate::traversal::Traversal;
use crate::traverser::{Traverser, TraverserRequirement};

pub mod filter;
pub mod identity;
pub mod map;
pub mod repeat;
pub mod side_effect;
pub mod vertex;

pub use filter::{Compare, CompareOp, IsStep};
pub use identity::IdentityStep;
pub use map::LambdaMapStep;
pub use repeat::{LoopStats, RepeatStep};
pub use side_effect::{CapStep, StoreStep};
pub use vertex::VertexStep;

/// A boxed step for dynamic dispatch.
pub type BoxedStep = Box<dyn Step>;

/// Common bookkeeping shared by every step.
#[derive(Debug, Clone, Default)]
pub struct StepBase {
    /// User-assigned label (`as(...)`).
    label: Option<String>,
}

impl StepBase {
    /// Creates a new, unlabelled step base.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the step label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Sets the step label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Returns a copy carrying the same label.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        self.clone()
    }
}

/// The upstream of a step during one pull.
///
/// Borrowed from the owning traversal for the duration of the pull; it
/// also exposes the traversal's graph and side-effect register.
pub struct StepInput<'a> {
    starts: &'a mut VecDeque<Traverser>,
    upstream: &'a mut [BoxedStep],
    graph: &'a dyn GraphAccessor,
    side_effects: &'a SideEffects,
}

impl<'a> StepInput<'a> {
    pub(crate) fn new(
        starts: &'a mut VecDeque<Traverser>,
        upstream: &'a mut [BoxedStep],
        graph: &'a dyn GraphAccessor,
        side_effects: &'a SideEffects,
    ) -> Self {
        Self { starts, upstream, graph, side_effects }
    }

    /// Pulls the next traverser from upstream.
    ///
    /// # Errors
    ///
    /// Propagates any error raised by an upstream step.
    pub fn pull(&mut self) -> ProcessResult<Option<Traverser>> {
        let Some((step, rest)) = self.upstream.split_last_mut() else {
            return Ok(self.starts.pop_front());
        };
        let mut input = StepInput {
            starts: &mut *self.starts,
            upstream: rest,
            graph: self.graph,
            side_effects: self.side_effects,
        };
        step.process_next(&mut input)
    }

    /// Returns the graph of the owning traversal.
    #[must_use]
    pub fn graph(&self) -> &'a dyn GraphAccessor {
        self.graph
    }

    /// Returns the side-effect register of the owning traversal.
    #[must_use]
    pub fn side_effects(&self) -> &'a SideEffects {
        self.side_effects
    }
}

/// The step trait for pull-based traversal execution.
///
/// Steps are single-consumer and single-threaded: one pull chain drives a
/// step at a time. The `Send` bound allows a whole traversal to move between
/// threads.
pub trait Step: Send {
    /// Produces the next traverser, or `None` if nothing is available.
    ///
    /// Called through [`StepInput::pull`] by the step downstream, or by the
    /// owning traversal for its last step.
    fn process_next(&mut self, input: &mut StepInput<'_>) -> ProcessResult<Option<Traverser>>;

    /// Returns the shared step bookkeeping.
    fn base(&self) -> &StepBase;

    /// Returns the shared step bookkeeping mutably.
    fn base_mut(&mut self) -> &mut StepBase;

    /// Returns the name of this step type.
    fn name(&self) -> &'static str;

    /// Encodes this step as bytecode instructions.
    ///
    /// The label, if any, is encoded by the owning traversal.
    fn instructions(&self) -> ProcessResult<Vec<Instruction>>;

    /// Returns an independent copy of this step.
    ///
    /// Cursor state is deep-copied so the copy can run in a different
    /// execution context without interfering with this one.
    fn duplicate(&self) -> BoxedStep;

    /// Human-readable rendering used by `Display` for traversals.
    fn describe(&self) -> String {
        self.name().to_owned()
    }

    /// Clears per-iteration cursor state.
    fn reset(&mut self) {}

    /// Returns the traverser capabilities this step needs.
    fn requirements(&self) -> BTreeSet<TraverserRequirement> {
        BTreeSet::new()
    }

    /// Checks that the step can run under `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Configuration`](crate::ProcessError::Configuration)
    /// when it cannot.
    fn validate(&self, _config: &TraversalConfig) -> ProcessResult<()> {
        Ok(())
    }

    /// Returns the traversals nested inside this step.
    fn local_traversals_mut(&mut self) -> Vec<&mut Traversal> {
        Vec::new()
    }

    /// Returns the register key this step writes, for side-effect steps.
    fn side_effect_key(&self) -> Option<&str> {
        None
    }

    /// Returns this step as a repeat step, if it is one.
    fn as_repeat(&self) -> Option<&RepeatStep> {
        None
    }

    /// Returns this step as a mutable repeat step, if it is one.
    fn as_repeat_mut(&mut self) -> Option<&mut RepeatStep> {
        None
    }

    /// Returns the step label, if any.
    fn label(&self) -> Option<&str> {
        self.base().label()
    }

    /// Sets the step label.
    fn set_label(&mut self, label: String) {
        self.base_mut().set_label(label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keeps_label() {
        let mut base = StepBase::new();
        base.set_label("a");
        assert_eq!(base.duplicate().label(), Some("a"));
        assert_eq!(StepBase::new().duplicate().label(), None);
    }

    #[test]
    fn empty_upstream_reads_starts() {
        let mut starts: VecDeque<Traverser> = [Traverser::new(1i64)].into_iter().collect();
        let mut steps: Vec<BoxedStep> = Vec::new();
        let graph = crate::graph::NullGraphAccessor;
        let side_effects = SideEffects::new();

        let mut input = StepInput::new(&mut starts, &mut steps, &graph, &side_effects);
        assert_eq!(input.pull().unwrap().map(Traverser::into_value), Some(1i64.into()));
        assert!(input.pull().unwrap().is_none());
        assert!(input.pull().unwrap().is_none());
    }
}
