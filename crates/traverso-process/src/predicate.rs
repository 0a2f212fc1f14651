//! Loop-exit and emit conditions for [`RepeatStep`](crate::step::RepeatStep).
//!
//! A [`RepeatPredicate`] is either a loop-count threshold or a nested
//! traversal that holds when it yields anything for the traverser under
//! test.

use std::fmt;

use crate::bytecode::Argument;
use crate::error::ProcessResult;
use crate::traversal::Traversal;
use crate::traverser::Traverser;

/// Holds when a traverser's loop count reaches a threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopsPredicate {
    max_loops: u32,
    label: Option<String>,
}

impl LoopsPredicate {
    /// Creates a threshold on the enclosing loop's counter.
    #[must_use]
    pub const fn new(max_loops: u32) -> Self {
        Self { max_loops, label: None }
    }

    /// Creates a threshold on the counter of the loop labelled `label`.
    #[must_use]
    pub fn labelled(label: impl Into<String>, max_loops: u32) -> Self {
        Self { max_loops, label: Some(label.into()) }
    }

    /// Returns the threshold.
    #[must_use]
    pub const fn max_loops(&self) -> u32 {
        self.max_loops
    }

    /// Returns the explicit loop label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns `true` if the counter has reached the threshold.
    #[must_use]
    pub fn test(&self, traverser: &Traverser, loop_label: &str) -> bool {
        let label = self.label.as_deref().unwrap_or(loop_label);
        traverser.loops(label) >= self.max_loops
    }
}

impl fmt::Display for LoopsPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "loops({label},{})", self.max_loops),
            None => write!(f, "loops({})", self.max_loops),
        }
    }
}

/// Holds when a nested traversal, started from the traverser under test,
/// produces at least one traverser.
///
/// The produced value is discarded. Each test resets the traversal first, so
/// tests never see each other's leftovers.
#[derive(Debug)]
pub struct TraversalPredicate {
    traversal: Traversal,
}

impl TraversalPredicate {
    /// Wraps a traversal.
    #[must_use]
    pub fn new(traversal: Traversal) -> Self {
        Self { traversal }
    }

    /// Returns the wrapped traversal.
    #[must_use]
    pub fn traversal(&self) -> &Traversal {
        &self.traversal
    }

    /// Tests a fork of `traverser` against the traversal.
    ///
    /// # Errors
    ///
    /// Propagates errors raised inside the traversal.
    pub fn test(&mut self, traverser: &Traverser) -> ProcessResult<bool> {
        self.traversal.reset();
        self.traversal.add_start(traverser.split());
        Ok(self.traversal.next_traverser()?.is_some())
    }

    /// Returns an independent copy.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self { traversal: self.traversal.duplicate() }
    }
}

/// A loop-exit or emit condition.
#[derive(Debug)]
pub enum RepeatPredicate {
    /// Loop-count threshold.
    Loops(LoopsPredicate),
    /// Nested traversal yields something.
    Traversal(TraversalPredicate),
}

impl RepeatPredicate {
    /// Holds once the enclosing loop has run `max_loops` times.
    #[must_use]
    pub const fn loops(max_loops: u32) -> Self {
        Self::Loops(LoopsPredicate::new(max_loops))
    }

    /// Holds once the loop labelled `label` has run `max_loops` times.
    #[must_use]
    pub fn loops_of(label: impl Into<String>, max_loops: u32) -> Self {
        Self::Loops(LoopsPredicate::labelled(label, max_loops))
    }

    /// Holds when `traversal` yields for the traverser under test.
    #[must_use]
    pub fn traversal(traversal: Traversal) -> Self {
        Self::Traversal(TraversalPredicate::new(traversal))
    }

    /// Always holds. Used for emitting every traverser.
    #[must_use]
    pub const fn always() -> Self {
        Self::loops(0)
    }

    /// Tests `traverser`. `loop_label` names the loop the predicate is
    /// attached to.
    ///
    /// # Errors
    ///
    /// Propagates errors raised inside a traversal predicate.
    pub fn test(&mut self, traverser: &Traverser, loop_label: &str) -> ProcessResult<bool> {
        match self {
            Self::Loops(loops) => Ok(loops.test(traverser, loop_label)),
            Self::Traversal(predicate) => predicate.test(traverser),
        }
    }

    /// Returns `true` for traversal predicates.
    #[must_use]
    pub const fn is_traversal(&self) -> bool {
        matches!(self, Self::Traversal(_))
    }

    /// Returns an independent copy.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        match self {
            Self::Loops(loops) => Self::Loops(loops.clone()),
            Self::Traversal(predicate) => Self::Traversal(predicate.duplicate()),
        }
    }

    /// Encodes the predicate as a bytecode argument.
    ///
    /// # Errors
    ///
    /// Propagates encoding errors of a traversal predicate.
    pub fn to_argument(&self) -> ProcessResult<Argument> {
        Ok(match self {
            Self::Loops(loops) => {
                Argument::Loops { max_loops: loops.max_loops, label: loops.label.clone() }
            }
            Self::Traversal(predicate) => Argument::Bytecode(predicate.traversal.bytecode()?),
        })
    }

    pub(crate) fn traversal_mut(&mut self) -> Option<&mut Traversal> {
        match self {
            Self::Loops(_) => None,
            Self::Traversal(predicate) => Some(&mut predicate.traversal),
        }
    }

    pub(crate) fn traversal_ref(&self) -> Option<&Traversal> {
        match self {
            Self::Loops(_) => None,
            Self::Traversal(predicate) => Some(&predicate.traversal),
        }
    }
}

impl fmt::Display for RepeatPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loops(loops) => fmt::Display::fmt(loops, f),
            Self::Traversal(predicate) => fmt::Display::fmt(&predicate.traversal, f),
        }
    }
}
