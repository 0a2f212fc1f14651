//! Side-effect auto-cap.

use crate::error::ProcessResult;
use crate::step::CapStep;
use crate::strategy::TraversalStrategy;
use crate::traversal::Traversal;

/// Appends `cap(key)` when the last step writes the register under `key`.
///
/// A traversal ending in `store("x")` then yields the stored array rather
/// than the traversers that passed through.
#[derive(Debug, Clone, Copy, Default)]
pub struct SideEffectCapStrategy;

impl SideEffectCapStrategy {
    /// The strategy name.
    pub const NAME: &'static str = "SideEffectCapStrategy";
}

impl TraversalStrategy for SideEffectCapStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, traversal: &mut Traversal) -> ProcessResult<()> {
        let key = traversal.steps().last().and_then(|step| step.side_effect_key()).map(str::to_owned);
        if let Some(key) = key {
            traversal.add_step(Box::new(CapStep::new(key)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_trailing_store() {
        let mut traversal = Traversal::anonymous().store("x").unwrap();
        SideEffectCapStrategy.apply(&mut traversal).unwrap();
        assert_eq!(traversal.to_string(), "[StoreStep(x), CapStep(x)]");

        SideEffectCapStrategy.apply(&mut traversal).unwrap();
        assert_eq!(traversal.steps().len(), 2);
    }

    #[test]
    fn leaves_other_traversals_alone() {
        let mut traversal = Traversal::anonymous().store("x").unwrap().identity().unwrap();
        SideEffectCapStrategy.apply(&mut traversal).unwrap();
        assert_eq!(traversal.steps().len(), 2);
    }
}
