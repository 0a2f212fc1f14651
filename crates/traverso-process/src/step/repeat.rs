//! Loop control: `repeat(...).until(...).emit(...)`.
//!
//! A [`RepeatStep`] runs each incoming traverser through an embedded body
//! traversal over and over. After every body pass the traverser's loop
//! counter is incremented and the until predicate decides whether it
//! escapes; otherwise it is fed back into the body. The emit predicate
//! additionally releases a fork of the traverser on each pass it holds for.
//!
//! # Check placement
//!
//! A predicate attached before the body ("first") is also checked on fresh
//! input, before the first body pass. This is what separates
//! `until(p).repeat(b)` (while-do) from `repeat(b).until(p)` (do-while).
//! Placement is fixed at attach time and survives duplication and bytecode.
//!
//! # Loop labels
//!
//! Every loop keeps its counter under a label. Unless `as(...)` names the
//! loop, the label is `repeat-<depth>`, where depth counts the loops the
//! step is nested in. It depends only on where the step sits, so a
//! traversal rebuilt from bytecode counts under the same labels and a
//! traverser shipped mid-loop resumes its count. Sibling loops may share a
//! label; a traverser's counter is cleared whenever it leaves a loop.
//!
//! # Termination
//!
//! The step enforces no iteration cap. A body that keeps producing with no
//! until predicate that ever holds never returns.

use std::collections::BTreeSet;

use tracing::trace;

use crate::bytecode::{Argument, Instruction};
use crate::config::TraversalConfig;
use crate::error::{ProcessError, ProcessResult};
use crate::predicate::RepeatPredicate;
use crate::step::{BoxedStep, Step, StepBase, StepInput};
use crate::traversal::{NestedScope, Traversal};
use crate::traverser::{Traverser, TraverserRequirement};

/// Counters for one repeat step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Body passes completed.
    pub iterations: u64,
    /// Forks released by the emit predicate.
    pub emitted: u64,
    /// Traversers that left through the until predicate.
    pub escaped: u64,
}

/// The loop-control step.
#[derive(Debug)]
pub struct RepeatStep {
    base: StepBase,
    depth: usize,
    loop_id: String,
    body: Option<Traversal>,
    until: Option<RepeatPredicate>,
    emit: Option<RepeatPredicate>,
    until_first: bool,
    emit_first: bool,
    stats: LoopStats,
}

impl RepeatStep {
    /// The step name.
    pub const NAME: &'static str = "RepeatStep";

    /// Creates an empty, top-level repeat step.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: StepBase::new(),
            depth: 0,
            loop_id: loop_id(0),
            body: None,
            until: None,
            emit: None,
            until_first: false,
            emit_first: false,
            stats: LoopStats::default(),
        }
    }

    /// Returns the label the loop counter is kept under.
    #[must_use]
    pub fn loop_label(&self) -> &str {
        self.base.label().unwrap_or(&self.loop_id)
    }

    /// Returns the number of loops this step is nested in.
    #[must_use]
    pub const fn loop_depth(&self) -> usize {
        self.depth
    }

    /// Moves the step to `depth`, along with everything nested in it.
    pub(crate) fn set_loop_depth(&mut self, depth: usize) {
        self.depth = depth;
        self.loop_id = loop_id(depth);
        for nested in self.local_traversals_mut() {
            nested.set_loop_depth(depth + 1);
        }
    }

    /// Returns the body, if set.
    #[must_use]
    pub fn body(&self) -> Option<&Traversal> {
        self.body.as_ref()
    }

    /// Returns `true` once a body is set.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Returns the until predicate, if set.
    #[must_use]
    pub fn until_predicate(&self) -> Option<&RepeatPredicate> {
        self.until.as_ref()
    }

    /// Returns the emit predicate, if set.
    #[must_use]
    pub fn emit_predicate(&self) -> Option<&RepeatPredicate> {
        self.emit.as_ref()
    }

    /// Returns `true` if until was attached before the body.
    #[must_use]
    pub const fn is_until_first(&self) -> bool {
        self.until_first
    }

    /// Returns `true` if emit was attached before the body.
    #[must_use]
    pub const fn is_emit_first(&self) -> bool {
        self.emit_first
    }

    /// Returns the loop counters.
    #[must_use]
    pub const fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Sets the body, binding it to `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Configuration`] if a body is already set.
    pub fn set_repeat_traversal(
        &mut self,
        mut body: Traversal,
        scope: &NestedScope,
    ) -> ProcessResult<()> {
        if self.body.is_some() {
            return Err(ProcessError::configuration("repeat step already has a body"));
        }
        body.adopt(scope);
        body.set_loop_depth(self.depth + 1);
        self.body = Some(body);
        Ok(())
    }

    /// Sets the until predicate.
    ///
    /// Marks it as checked on fresh input if no body is set yet.
    pub fn set_until_predicate(&mut self, mut predicate: RepeatPredicate) {
        if let Some(traversal) = predicate.traversal_mut() {
            traversal.set_loop_depth(self.depth + 1);
        }
        if self.body.is_none() {
            self.until_first = true;
        }
        self.until = Some(predicate);
    }

    /// Sets the emit predicate.
    ///
    /// Marks it as checked on fresh input if no body is set yet.
    pub fn set_emit_predicate(&mut self, mut predicate: RepeatPredicate) {
        if let Some(traversal) = predicate.traversal_mut() {
            traversal.set_loop_depth(self.depth + 1);
        }
        if self.body.is_none() {
            self.emit_first = true;
        }
        self.emit = Some(predicate);
    }

    fn no_body() -> ProcessError {
        ProcessError::configuration("repeat step has no traversal to repeat")
    }
}

impl Default for RepeatStep {
    fn default() -> Self {
        Self::new()
    }
}

fn loop_id(depth: usize) -> String {
    format!("repeat-{depth}")
}

fn holds(
    predicate: &mut Option<RepeatPredicate>,
    traverser: &Traverser,
    label: &str,
) -> ProcessResult<bool> {
    match predicate {
        Some(predicate) => predicate.test(traverser, label),
        None => Ok(false),
    }
}

fn emitted_fork(traverser: &Traverser, label: &str) -> Traverser {
    let mut fork = traverser.split();
    fork.reset_loops(label);
    fork
}

impl Step for RepeatStep {
    fn process_next(&mut self, input: &mut StepInput<'_>) -> ProcessResult<Option<Traverser>> {
        let label = self.base.label().unwrap_or(&self.loop_id);
        let body = self.body.as_mut().ok_or_else(Self::no_body)?;
        loop {
            if let Some(mut traverser) = body.next_traverser()? {
                traverser.incr_loops(label);
                self.stats.iterations += 1;
                if holds(&mut self.until, &traverser, label)? {
                    trace!(label, loops = traverser.loops(label), "left loop through until");
                    traverser.reset_loops(label);
                    self.stats.escaped += 1;
                    return Ok(Some(traverser));
                }
                let fork = holds(&mut self.emit, &traverser, label)?
                    .then(|| emitted_fork(&traverser, label));
                body.add_start(traverser);
                if let Some(fork) = fork {
                    trace!(label, bulk = fork.bulk(), "emitted from loop");
                    self.stats.emitted += 1;
                    return Ok(Some(fork));
                }
            } else {
                let Some(mut traverser) = input.pull()? else {
                    return Ok(None);
                };
                if self.until_first && holds(&mut self.until, &traverser, label)? {
                    trace!(label, "skipped loop through until");
                    traverser.reset_loops(label);
                    self.stats.escaped += 1;
                    return Ok(Some(traverser));
                }
                let fork = (self.emit_first && holds(&mut self.emit, &traverser, label)?)
                    .then(|| emitted_fork(&traverser, label));
                body.add_start(traverser);
                if let Some(fork) = fork {
                    trace!(label, bulk = fork.bulk(), "emitted before loop");
                    self.stats.emitted += 1;
                    return Ok(Some(fork));
                }
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
        let repeat = self
            .body
            .as_ref()
            .map(|body| -> ProcessResult<Instruction> {
                Ok(Instruction::new("repeat", vec![Argument::Bytecode(body.bytecode()?)]))
            })
            .transpose()?;
        let until = self
            .until
            .as_ref()
            .map(|p| -> ProcessResult<Instruction> {
                Ok(Instruction::new("until", vec![p.to_argument()?]))
            })
            .transpose()?;
        let emit = self
            .emit
            .as_ref()
            .map(|p| -> ProcessResult<Instruction> {
                Ok(Instruction::new("emit", vec![p.to_argument()?]))
            })
            .transpose()?;

        let ordered = match (self.until_first, self.emit_first) {
            (true, true) => [until, emit, repeat],
            (false, true) => [emit, repeat, until],
            (true, false) => [until, repeat, emit],
            (false, false) => [repeat, until, emit],
        };
        Ok(ordered.into_iter().flatten().collect())
    }

    fn duplicate(&self) -> BoxedStep {
        Box::new(Self {
            base: self.base.duplicate(),
            depth: self.depth,
            loop_id: self.loop_id.clone(),
            body: self.body.as_ref().map(Traversal::duplicate),
            until: self.until.as_ref().map(RepeatPredicate::duplicate),
            emit: self.emit.as_ref().map(RepeatPredicate::duplicate),
            until_first: self.until_first,
            emit_first: self.emit_first,
            stats: LoopStats::default(),
        })
    }

    fn describe(&self) -> String {
        let until = self
            .until
            .as_ref()
            .map_or_else(|| "until(false)".to_owned(), |p| format!("until({p})"));
        let emit = self
            .emit
            .as_ref()
            .map_or_else(|| "emit(false)".to_owned(), |p| format!("emit({p})"));
        let body = self.body.as_ref().map_or_else(|| "[]".to_owned(), ToString::to_string);

        let parts = match (self.until_first, self.emit_first) {
            (true, true) => [until, emit, body],
            (false, true) => [emit, body, until],
            (true, false) => [until, body, emit],
            (false, false) => [body, until, emit],
        };
        format!("{}({})", Self::NAME, parts.join(","))
    }

    fn reset(&mut self) {
        if let Some(body) = self.body.as_mut() {
            body.reset();
        }
    }

    fn requirements(&self) -> BTreeSet<TraverserRequirement> {
        let mut requirements =
            self.body.as_ref().map(Traversal::requirements).unwrap_or_default();
        if requirements.contains(&TraverserRequirement::SingleLoop) {
            requirements.insert(TraverserRequirement::NestedLoop);
        }
        requirements.insert(TraverserRequirement::SingleLoop);
        requirements.insert(TraverserRequirement::Bulk);
        requirements
    }

    fn validate(&self, config: &TraversalConfig) -> ProcessResult<()> {
        let body = self.body.as_ref().ok_or_else(Self::no_body)?;
        if config.is_partitioned()
            && [&self.until, &self.emit].into_iter().flatten().any(RepeatPredicate::is_traversal)
        {
            return Err(ProcessError::configuration(
                "traversal predicates cannot run in partitioned mode",
            ));
        }
        body.validate()?;
        for predicate in [&self.until, &self.emit].into_iter().flatten() {
            if let Some(traversal) = predicate.traversal_ref() {
                traversal.validate()?;
            }
        }
        Ok(())
    }

    fn local_traversals_mut(&mut self) -> Vec<&mut Traversal> {
        let mut nested = Vec::new();
        if let Some(body) = self.body.as_mut() {
            nested.push(body);
        }
        if let Some(traversal) = self.until.as_mut().and_then(RepeatPredicate::traversal_mut) {
            nested.push(traversal);
        }
        if let Some(traversal) = self.emit.as_mut().and_then(RepeatPredicate::traversal_mut) {
            nested.push(traversal);
        }
        nested
    }

    fn as_repeat(&self) -> Option<&RepeatStep> {
        Some(self)
    }

    fn as_repeat_mut(&mut self) -> Option<&mut RepeatStep> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_follow_attach_order() {
        let scope = NestedScope::detached();

        let mut while_do = RepeatStep::new();
        while_do.set_until_predicate(RepeatPredicate::loops(1));
        while_do.set_repeat_traversal(Traversal::anonymous(), &scope).unwrap();
        while_do.set_emit_predicate(RepeatPredicate::always());
        assert!(while_do.is_until_first());
        assert!(!while_do.is_emit_first());

        let mut do_while = RepeatStep::new();
        do_while.set_repeat_traversal(Traversal::anonymous(), &scope).unwrap();
        do_while.set_until_predicate(RepeatPredicate::loops(1));
        assert!(!do_while.is_until_first());
    }

    #[test]
    fn second_body_is_rejected() {
        let scope = NestedScope::detached();
        let mut step = RepeatStep::new();
        step.set_repeat_traversal(Traversal::anonymous(), &scope).unwrap();
        let err = step.set_repeat_traversal(Traversal::anonymous(), &scope).unwrap_err();
        assert!(matches!(err, ProcessError::Configuration(_)));
    }

    #[test]
    fn loop_labels_follow_nesting_depth() {
        let scope = NestedScope::detached();
        let mut inner = RepeatStep::new();
        inner.set_repeat_traversal(Traversal::anonymous(), &scope).unwrap();
        assert_eq!(inner.loop_label(), "repeat-0");
        assert_eq!(RepeatStep::new().loop_label(), inner.loop_label());

        let mut body = Traversal::anonymous();
        body.add_step(Box::new(inner)).unwrap();
        let mut predicate = Traversal::anonymous();
        predicate.add_step(Box::new(RepeatStep::new())).unwrap();

        let mut outer = RepeatStep::new();
        outer.set_repeat_traversal(body, &scope).unwrap();
        outer.set_until_predicate(RepeatPredicate::traversal(predicate));
        assert_eq!(outer.loop_label(), "repeat-0");

        let nested = |t: Option<&Traversal>| {
            t.and_then(|t| t.steps()[0].as_repeat()).map(|s| s.loop_label().to_owned())
        };
        assert_eq!(nested(outer.body()).as_deref(), Some("repeat-1"));
        assert_eq!(
            nested(outer.until_predicate().and_then(RepeatPredicate::traversal_ref)).as_deref(),
            Some("repeat-1")
        );

        outer.set_label("outer".to_owned());
        assert_eq!(outer.loop_label(), "outer");
    }

    #[test]
    fn requirements_nest() {
        let scope = NestedScope::detached();
        let mut inner = RepeatStep::new();
        inner.set_repeat_traversal(Traversal::anonymous(), &scope).unwrap();
        let inner_reqs = inner.requirements();
        assert!(inner_reqs.contains(&TraverserRequirement::SingleLoop));
        assert!(!inner_reqs.contains(&TraverserRequirement::NestedLoop));

        let mut body = Traversal::anonymous();
        body.add_step(Box::new(inner)).unwrap();
        let mut outer = RepeatStep::new();
        outer.set_repeat_traversal(body, &scope).unwrap();
        let outer_reqs = outer.requirements();
        assert!(outer_reqs.contains(&TraverserRequirement::NestedLoop));
        assert!(outer_reqs.contains(&TraverserRequirement::Bulk));
    }

    #[test]
    fn describe_orders_parts_by_attachment() {
        let scope = NestedScope::detached();
        let mut step = RepeatStep::new();
        step.set_emit_predicate(RepeatPredicate::always());
        step.set_repeat_traversal(Traversal::anonymous(), &scope).unwrap();
        assert_eq!(step.describe(), "RepeatStep(emit(loops(0)),[],until(false))");
    }

    #[test]
    fn missing_body_fails_validation() {
        let step = RepeatStep::new();
        let err = step.validate(&TraversalConfig::default()).unwrap_err();
        assert!(matches!(err, ProcessError::Configuration(_)));
    }
}
