//! Identity step removal.

use crate::error::ProcessResult;
use crate::step::IdentityStep;
use crate::strategy::TraversalStrategy;
use crate::traversal::Traversal;

/// Drops identity steps that carry no label.
///
/// Labelled identity steps are kept: something may refer to the label.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRemovalStrategy;

impl IdentityRemovalStrategy {
    /// The strategy name.
    pub const NAME: &'static str = "IdentityRemovalStrategy";
}

impl TraversalStrategy for IdentityRemovalStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, traversal: &mut Traversal) -> ProcessResult<()> {
        let mut index = 0;
        while index < traversal.steps().len() {
            let step = &traversal.steps()[index];
            if step.name() == IdentityStep::NAME && step.label().is_none() {
                traversal.remove_step(index)?;
            } else {
                index += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_unlabelled_identities_only() {
        let mut traversal = Traversal::anonymous()
            .identity()
            .unwrap()
            .store("x")
            .unwrap()
            .identity()
            .unwrap()
            .as_("keep")
            .unwrap()
            .identity()
            .unwrap();

        IdentityRemovalStrategy.apply(&mut traversal).unwrap();
        assert_eq!(traversal.to_string(), "[StoreStep(x), IdentityStep@[keep]]");
    }
}
