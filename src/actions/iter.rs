use std::iter::FusedIterator;

use super::{Action, PackedActions};

/// Lazy decoder over the actions of a [`PackedActions`].
///
/// Forward iteration runs from the start of the alignment to its end (oldest to newest).
/// Reverse iteration via [`DoubleEndedIterator`] runs newest to oldest.
/// Each step decodes a single 4-bit code.
#[derive(Debug, Clone)]
pub struct ActionIter<'a> {
    actions: &'a PackedActions,
    /// One past the next storage position yielded by `next`
    front: usize,
    /// Next storage position yielded by `next_back`
    back: usize,
}
impl<'a> ActionIter<'a> {
    pub(crate) fn new(actions: &'a PackedActions) -> Self {
        Self {
            actions,
            front: actions.len(),
            back: 0,
        }
    }
}
impl Iterator for ActionIter<'_> {
    type Item = Action;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.front -= 1;
        Some(Action::from_nibble(self.actions.code_at(self.front)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.front - self.back;
        (remaining, Some(remaining))
    }
}
impl DoubleEndedIterator for ActionIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let action = Action::from_nibble(self.actions.code_at(self.back));
        self.back += 1;
        Some(action)
    }
}
impl ExactSizeIterator for ActionIter<'_> {}
impl FusedIterator for ActionIter<'_> {}

impl<'a> IntoIterator for &'a PackedActions {
    type Item = Action;
    type IntoIter = ActionIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
