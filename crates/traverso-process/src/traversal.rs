//! The traversal: an ordered pipeline of steps with a fluent builder.
//!
//! A [`Traversal`] owns its steps, a buffer of start traversers, a handle to
//! its side-effect register, the strategies to apply before the first pull,
//! the graph it walks and its configuration.
//!
//! # Lifecycle
//!
//! 1. **Build**: steps are appended through the builder methods.
//! 2. **Prepare**: on the first pull, strategies rewrite the steps once and
//!    every step is validated. The traversal is then locked.
//! 3. **Run**: [`next_traverser`](Traversal::next_traverser) pulls results.
//!    [`reset`](Traversal::reset) clears cursor state for another run.
//!
//! # Nesting
//!
//! Loop bodies and traversal predicates are traversals too. When one is
//! attached, it is bound to a [`NestedScope`] derived from its parent: same
//! register, graph and configuration, and the parent's strategies minus the
//! side-effect cap.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use tracing::debug;
use traverso_core::{Direction, Value};

use crate::bytecode::{Argument, Bytecode, Instruction};
use crate::config::TraversalConfig;
use crate::error::{ProcessError, ProcessResult};
use crate::graph::{GraphAccessor, NullGraphAccessor};
use crate::predicate::RepeatPredicate;
use crate::side_effects::SideEffects;
use crate::step::{
    BoxedStep, CapStep, Compare, IdentityStep, IsStep, LambdaMapStep, RepeatStep, Step, StepInput,
    StoreStep, VertexStep,
};
use crate::strategy::{SideEffectCapStrategy, TraversalStrategies};
use crate::traverser::{Traverser, TraverserRequirement};

/// The environment a nested traversal is bound to when it is attached.
#[derive(Clone)]
pub struct NestedScope {
    side_effects: SideEffects,
    strategies: TraversalStrategies,
    graph: Arc<dyn GraphAccessor>,
    config: TraversalConfig,
}

impl NestedScope {
    /// A scope with a fresh register, no strategies and no graph.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            side_effects: SideEffects::new(),
            strategies: TraversalStrategies::new(),
            graph: Arc::new(NullGraphAccessor),
            config: TraversalConfig::default(),
        }
    }

    /// Returns the register nested traversals write to.
    #[must_use]
    pub fn side_effects(&self) -> &SideEffects {
        &self.side_effects
    }

    /// Returns the strategies nested traversals run.
    #[must_use]
    pub fn strategies(&self) -> &TraversalStrategies {
        &self.strategies
    }
}

impl fmt::Debug for NestedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedScope")
            .field("side_effects", &self.side_effects)
            .field("strategies", &self.strategies)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// An ordered pipeline of steps.
pub struct Traversal {
    steps: Vec<BoxedStep>,
    starts: VecDeque<Traverser>,
    lookahead: Option<Traverser>,
    side_effects: SideEffects,
    strategies: TraversalStrategies,
    graph: Arc<dyn GraphAccessor>,
    config: TraversalConfig,
    source: Vec<Instruction>,
    loop_depth: usize,
    strategies_applied: bool,
    locked: bool,
}

impl Traversal {
    /// Creates an unbound traversal with no starts.
    ///
    /// Used to build loop bodies and predicates; it picks up its register,
    /// graph and strategies when attached to a parent.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::bound(
            Arc::new(NullGraphAccessor),
            TraversalStrategies::new(),
            TraversalConfig::default(),
            SideEffects::new(),
        )
    }

    pub(crate) fn bound(
        graph: Arc<dyn GraphAccessor>,
        strategies: TraversalStrategies,
        config: TraversalConfig,
        side_effects: SideEffects,
    ) -> Self {
        Self {
            steps: Vec::new(),
            starts: VecDeque::new(),
            lookahead: None,
            side_effects,
            strategies,
            graph,
            config,
            source: Vec::new(),
            loop_depth: 0,
            strategies_applied: false,
            locked: false,
        }
    }

    pub(crate) fn push_source(&mut self, instruction: Instruction, starts: Vec<Traverser>) {
        self.source.push(instruction);
        self.starts.extend(starts);
    }

    // ========== Steps ==========

    /// Returns the steps in pipeline order.
    #[must_use]
    pub fn steps(&self) -> &[BoxedStep] {
        &self.steps
    }

    /// Returns the last step, if any.
    #[must_use]
    pub fn end_step(&self) -> Option<&dyn Step> {
        self.steps.last().map(|step| &**step)
    }

    /// Appends a step.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] once the traversal is locked.
    pub fn add_step(&mut self, mut step: BoxedStep) -> ProcessResult<()> {
        self.ensure_unlocked()?;
        self.place(&mut step);
        self.steps.push(step);
        Ok(())
    }

    /// Inserts a step at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] once the traversal is
    /// locked or if `index` is out of bounds.
    pub fn insert_step(&mut self, index: usize, mut step: BoxedStep) -> ProcessResult<()> {
        self.ensure_unlocked()?;
        if index > self.steps.len() {
            return Err(ProcessError::invariant(format!(
                "step index {index} out of bounds for {} steps",
                self.steps.len()
            )));
        }
        self.place(&mut step);
        self.steps.insert(index, step);
        Ok(())
    }

    /// Removes and returns the step at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] once the traversal is
    /// locked or if `index` is out of bounds.
    pub fn remove_step(&mut self, index: usize) -> ProcessResult<BoxedStep> {
        self.ensure_unlocked()?;
        if index >= self.steps.len() {
            return Err(ProcessError::invariant(format!(
                "step index {index} out of bounds for {} steps",
                self.steps.len()
            )));
        }
        Ok(self.steps.remove(index))
    }

    fn place(&self, step: &mut BoxedStep) {
        if let Some(repeat) = step.as_repeat_mut() {
            repeat.set_loop_depth(self.loop_depth);
        }
    }

    /// Returns the number of loops this traversal runs inside.
    #[must_use]
    pub const fn loop_depth(&self) -> usize {
        self.loop_depth
    }

    pub(crate) fn set_loop_depth(&mut self, depth: usize) {
        self.loop_depth = depth;
        for step in &mut self.steps {
            if let Some(repeat) = step.as_repeat_mut() {
                repeat.set_loop_depth(depth);
            }
        }
    }

    fn ensure_unlocked(&self) -> ProcessResult<()> {
        if self.locked {
            return Err(ProcessError::invariant("traversal is locked; no more steps can be added"));
        }
        Ok(())
    }

    // ========== Environment ==========

    /// Returns the side-effect register.
    #[must_use]
    pub fn side_effects(&self) -> &SideEffects {
        &self.side_effects
    }

    /// Rebinds this traversal and every nested traversal to `side_effects`.
    pub fn set_side_effects(&mut self, side_effects: SideEffects) {
        for step in &mut self.steps {
            for nested in step.local_traversals_mut() {
                nested.set_side_effects(side_effects.clone());
            }
        }
        self.side_effects = side_effects;
    }

    /// Returns the strategies applied before the first pull.
    #[must_use]
    pub fn strategies(&self) -> &TraversalStrategies {
        &self.strategies
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// Returns the graph.
    #[must_use]
    pub fn graph(&self) -> &Arc<dyn GraphAccessor> {
        &self.graph
    }

    /// Returns `true` once the traversal has been prepared.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Returns the scope traversals attached to this one are bound to.
    #[must_use]
    pub fn nested_scope(&self) -> NestedScope {
        NestedScope {
            side_effects: self.side_effects.clone(),
            strategies: self.strategies.without(SideEffectCapStrategy::NAME),
            graph: Arc::clone(&self.graph),
            config: self.config.clone(),
        }
    }

    /// Binds this traversal, and everything nested in it, to `scope`.
    ///
    /// Entries already in this traversal's register are merged into the
    /// scope's register; keys the scope already holds keep their value.
    pub(crate) fn adopt(&mut self, scope: &NestedScope) {
        self.side_effects.merge_into(&scope.side_effects);
        self.side_effects = scope.side_effects.clone();
        self.strategies = scope.strategies.clone();
        self.graph = Arc::clone(&scope.graph);
        self.config = scope.config.clone();
        for step in &mut self.steps {
            for nested in step.local_traversals_mut() {
                nested.adopt(scope);
            }
        }
    }

    // ========== Execution ==========

    /// Adds a start traverser.
    pub fn add_start(&mut self, traverser: Traverser) {
        self.starts.push_back(traverser);
    }

    /// Adds several start traversers.
    pub fn add_starts(&mut self, traversers: impl IntoIterator<Item = Traverser>) {
        self.starts.extend(traversers);
    }

    /// Applies strategies (once) and validates every step, then locks the
    /// traversal.
    ///
    /// Called implicitly by the first pull.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Configuration`] if a step cannot run under
    /// this traversal's configuration, or any error raised by a strategy.
    pub fn prepare(&mut self) -> ProcessResult<()> {
        if self.locked {
            return Ok(());
        }
        if !self.strategies_applied {
            let strategies = self.strategies.clone();
            for strategy in strategies.iter() {
                strategy.apply(self)?;
            }
            self.strategies_applied = true;
            if !strategies.is_empty() {
                debug!(%strategies, steps = self.steps.len(), "applied traversal strategies");
            }
        }
        self.validate()?;
        self.locked = true;
        Ok(())
    }

    /// Validates every step against this traversal's configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error.
    pub fn validate(&self) -> ProcessResult<()> {
        for step in &self.steps {
            step.validate(&self.config)?;
        }
        Ok(())
    }

    /// Pulls the next result, or `None` when nothing is available.
    ///
    /// # Errors
    ///
    /// Returns preparation errors and any error raised by a step.
    pub fn next_traverser(&mut self) -> ProcessResult<Option<Traverser>> {
        self.prepare()?;
        if let Some(traverser) = self.lookahead.take() {
            return Ok(Some(traverser));
        }
        let mut input = StepInput::new(
            &mut self.starts,
            &mut self.steps,
            &*self.graph,
            &self.side_effects,
        );
        input.pull()
    }

    /// Returns `true` if another result is available.
    ///
    /// # Errors
    ///
    /// Same as [`next_traverser`](Self::next_traverser).
    pub fn has_next(&mut self) -> ProcessResult<bool> {
        if self.lookahead.is_none() {
            self.lookahead = self.next_traverser()?;
        }
        Ok(self.lookahead.is_some())
    }

    /// Pulls every remaining result.
    ///
    /// # Errors
    ///
    /// Same as [`next_traverser`](Self::next_traverser).
    pub fn to_list(&mut self) -> ProcessResult<Vec<Traverser>> {
        let mut results = Vec::new();
        while let Some(traverser) = self.next_traverser()? {
            results.push(traverser);
        }
        Ok(results)
    }

    /// Pulls every remaining result and expands bulk into repeated values.
    ///
    /// # Errors
    ///
    /// Same as [`next_traverser`](Self::next_traverser).
    pub fn values(&mut self) -> ProcessResult<Vec<Value>> {
        let mut values = Vec::new();
        while let Some(traverser) = self.next_traverser()? {
            for _ in 1..traverser.bulk() {
                values.push(traverser.value().clone());
            }
            values.push(traverser.into_value());
        }
        Ok(values)
    }

    /// Pulls and discards every remaining result, for side effects only.
    ///
    /// # Errors
    ///
    /// Same as [`next_traverser`](Self::next_traverser).
    pub fn iterate(&mut self) -> ProcessResult<()> {
        while self.next_traverser()?.is_some() {}
        Ok(())
    }

    /// Clears starts, the lookahead and per-step cursor state.
    ///
    /// Applied strategies and the lock are kept.
    pub fn reset(&mut self) {
        self.starts.clear();
        self.lookahead = None;
        for step in &mut self.steps {
            step.reset();
        }
    }

    /// Returns an independent copy.
    ///
    /// Steps and buffered traversers are deep-copied; the copy shares this
    /// traversal's register and graph.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            steps: self.steps.iter().map(|step| step.duplicate()).collect(),
            starts: self.starts.clone(),
            lookahead: self.lookahead.clone(),
            side_effects: self.side_effects.clone(),
            strategies: self.strategies.clone(),
            graph: Arc::clone(&self.graph),
            config: self.config.clone(),
            source: self.source.clone(),
            loop_depth: self.loop_depth,
            strategies_applied: self.strategies_applied,
            locked: self.locked,
        }
    }

    /// Returns the union of every step's requirements.
    #[must_use]
    pub fn requirements(&self) -> BTreeSet<TraverserRequirement> {
        self.steps.iter().flat_map(|step| step.requirements()).collect()
    }

    /// Encodes this traversal as bytecode.
    ///
    /// # Errors
    ///
    /// Propagates errors from steps that cannot be encoded.
    pub fn bytecode(&self) -> ProcessResult<Bytecode> {
        let mut step_instructions = Vec::new();
        for step in &self.steps {
            step_instructions.extend(step.instructions()?);
            if let Some(label) = step.label() {
                step_instructions
                    .push(Instruction::new("as", vec![Argument::Value(Value::from(label))]));
            }
        }
        Ok(Bytecode { source_instructions: self.source.clone(), step_instructions })
    }

    // ========== Builder ==========

    fn then(mut self, step: impl Step + 'static) -> ProcessResult<Self> {
        self.add_step(Box::new(step))?;
        Ok(self)
    }

    fn end_repeat(&self) -> Option<&RepeatStep> {
        self.steps.last().and_then(|step| step.as_repeat())
    }

    fn end_repeat_mut(&mut self) -> Option<&mut RepeatStep> {
        self.steps.last_mut().and_then(|step| step.as_repeat_mut())
    }

    /// Appends an identity step.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] once the traversal is locked.
    pub fn identity(self) -> ProcessResult<Self> {
        self.then(IdentityStep::new())
    }

    /// Appends a vertex step following `labels` (all edges if empty).
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] once the traversal is locked.
    pub fn vertex(self, direction: Direction, labels: Vec<String>) -> ProcessResult<Self> {
        self.then(VertexStep::new(direction, labels))
    }

    /// Moves to out-adjacent vertices.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] once the traversal is locked.
    pub fn out(self, labels: &[&str]) -> ProcessResult<Self> {
        self.vertex(Direction::Out, owned(labels))
    }

    /// Moves to in-adjacent vertices.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] once the traversal is locked.
    pub fn in_(self, labels: &[&str]) -> ProcessResult<Self> {
        self.vertex(Direction::In, owned(labels))
    }

    /// Moves to adjacent vertices in both directions.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] once the traversal is locked.
    pub fn both(self, labels: &[&str]) -> ProcessResult<Self> {
        self.vertex(Direction::Both, owned(labels))
    }

    /// Keeps traversers whose value satisfies `compare`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] once the traversal is locked.
    pub fn is(self, compare: Compare) -> ProcessResult<Self> {
        self.then(IsStep::new(compare))
    }

    /// Maps each value through `function`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] once the traversal is locked.
    pub fn map<F>(self, name: impl Into<String>, function: F) -> ProcessResult<Self>
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.then(LambdaMapStep::new(name, function))
    }

    /// Appends each value to the register array under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] once the traversal is locked.
    pub fn store(self, key: impl Into<String>) -> ProcessResult<Self> {
        self.then(StoreStep::new(key))
    }

    /// Emits the register value under `key` once upstream is drained.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] once the traversal is locked.
    pub fn cap(self, key: impl Into<String>) -> ProcessResult<Self> {
        self.then(CapStep::new(key))
    }

    /// Labels the last step. On a repeat step the label names its loop.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Configuration`] if there is no step to label.
    pub fn as_(mut self, label: impl Into<String>) -> ProcessResult<Self> {
        self.ensure_unlocked()?;
        let step = self
            .steps
            .last_mut()
            .ok_or_else(|| ProcessError::configuration("as() requires a preceding step"))?;
        step.set_label(label.into());
        Ok(self)
    }

    /// Sets the loop body.
    ///
    /// Completes a trailing repeat step that has no body yet, otherwise
    /// appends a new one. The body is bound to this traversal's nested scope.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvariantViolation`] once the traversal is locked.
    pub fn repeat(mut self, body: Traversal) -> ProcessResult<Self> {
        self.ensure_unlocked()?;
        let scope = self.nested_scope();
        let coalesce = self.end_repeat().is_some_and(|step| !step.has_body());
        if coalesce {
            if let Some(step) = self.end_repeat_mut() {
                step.set_repeat_traversal(body, &scope)?;
            }
            Ok(self)
        } else {
            let mut step = RepeatStep::new();
            step.set_repeat_traversal(body, &scope)?;
            self.then(step)
        }
    }

    /// Sets the loop-exit predicate.
    ///
    /// Completes a trailing repeat step that has no until predicate yet,
    /// otherwise appends a new one. Attached before the body, the predicate
    /// is also checked before the first pass.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Configuration`] for a traversal predicate in
    /// partitioned mode, and [`ProcessError::InvariantViolation`] once the
    /// traversal is locked.
    pub fn until(mut self, predicate: RepeatPredicate) -> ProcessResult<Self> {
        self.ensure_unlocked()?;
        let predicate = self.adopt_predicate(predicate)?;
        let coalesce = self.end_repeat().is_some_and(|step| step.until_predicate().is_none());
        if coalesce {
            if let Some(step) = self.end_repeat_mut() {
                step.set_until_predicate(predicate);
            }
            Ok(self)
        } else {
            let mut step = RepeatStep::new();
            step.set_until_predicate(predicate);
            self.then(step)
        }
    }

    /// Sets the emit predicate.
    ///
    /// Completes a trailing repeat step that has no emit predicate yet,
    /// otherwise appends a new one. Attached before the body, the predicate
    /// is also checked before the first pass.
    ///
    /// # Errors
    ///
    /// Same as [`until`](Self::until).
    pub fn emit(mut self, predicate: RepeatPredicate) -> ProcessResult<Self> {
        self.ensure_unlocked()?;
        let predicate = self.adopt_predicate(predicate)?;
        let coalesce = self.end_repeat().is_some_and(|step| step.emit_predicate().is_none());
        if coalesce {
            if let Some(step) = self.end_repeat_mut() {
                step.set_emit_predicate(predicate);
            }
            Ok(self)
        } else {
            let mut step = RepeatStep::new();
            step.set_emit_predicate(predicate);
            self.then(step)
        }
    }

    /// Exits the loop once it has run `max_loops` times.
    ///
    /// # Errors
    ///
    /// Same as [`until`](Self::until).
    pub fn until_loops(self, max_loops: u32) -> ProcessResult<Self> {
        self.until(RepeatPredicate::loops(max_loops))
    }

    /// Exits the loop when `traversal` yields for the traverser.
    ///
    /// # Errors
    ///
    /// Same as [`until`](Self::until).
    pub fn until_traversal(self, traversal: Traversal) -> ProcessResult<Self> {
        self.until(RepeatPredicate::traversal(traversal))
    }

    /// Alias of [`until_loops`](Self::until_loops).
    ///
    /// # Errors
    ///
    /// Same as [`until`](Self::until).
    pub fn times(self, max_loops: u32) -> ProcessResult<Self> {
        self.until_loops(max_loops)
    }

    /// Emits once the loop has run at least `min_loops` times.
    ///
    /// # Errors
    ///
    /// Same as [`until`](Self::until).
    pub fn emit_loops(self, min_loops: u32) -> ProcessResult<Self> {
        self.emit(RepeatPredicate::loops(min_loops))
    }

    /// Emits when `traversal` yields for the traverser.
    ///
    /// # Errors
    ///
    /// Same as [`until`](Self::until).
    pub fn emit_traversal(self, traversal: Traversal) -> ProcessResult<Self> {
        self.emit(RepeatPredicate::traversal(traversal))
    }

    /// Emits every traverser on every pass.
    ///
    /// # Errors
    ///
    /// Same as [`until`](Self::until).
    pub fn emit_all(self) -> ProcessResult<Self> {
        self.emit(RepeatPredicate::always())
    }

    fn adopt_predicate(&self, mut predicate: RepeatPredicate) -> ProcessResult<RepeatPredicate> {
        if let Some(traversal) = predicate.traversal_mut() {
            if self.config.is_partitioned() {
                return Err(ProcessError::configuration(
                    "traversal predicates cannot run in partitioned mode",
                ));
            }
            traversal.adopt(&self.nested_scope());
        }
        Ok(predicate)
    }
}

fn owned(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|label| (*label).to_owned()).collect()
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&step.describe())?;
            if let Some(label) = step.label() {
                write!(f, "@[{label}]")?;
            }
        }
        f.write_str("]")
    }
}

impl fmt::Debug for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traversal")
            .field("steps", &self.to_string())
            .field("starts", &self.starts.len())
            .field("side_effects", &self.side_effects)
            .field("strategies", &self.strategies)
            .field("config", &self.config)
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}
