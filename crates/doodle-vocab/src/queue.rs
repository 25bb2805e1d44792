//! Shuffled target queue
//!
//! One queue per playthrough. The order is fixed when the queue is built and
//! the cursor only moves forward; "play again" builds a fresh queue.

use crate::error::VocabError;
use crate::filter::{filter_labels, BannedLabels};
use crate::label::Label;
use indexmap::IndexSet;
use rand::seq::SliceRandom;
use rand::Rng;

/// Prompts for one playthrough plus the position of the current prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetQueue {
    targets: Vec<Label>,
    cursor: usize,
}

impl TargetQueue {
    /// Filter, deduplicate and shuffle a vocabulary into a new queue
    ///
    /// Duplicates keep their first occurrence before shuffling, so every
    /// playable label appears exactly once.
    pub fn build<R>(vocabulary: &[Label], banned: &BannedLabels, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let unique: IndexSet<Label> = filter_labels(vocabulary, banned).into_iter().collect();
        let mut targets: Vec<Label> = unique.into_iter().collect();
        targets.shuffle(rng);

        tracing::debug!(
            playable = targets.len(),
            vocabulary = vocabulary.len(),
            "Built target queue"
        );

        Self { targets, cursor: 0 }
    }

    /// Queue over an already ordered target list (no filtering, no shuffle)
    #[inline]
    #[must_use]
    pub fn from_ordered(targets: Vec<Label>) -> Self {
        Self { targets, cursor: 0 }
    }

    /// Label at the cursor
    ///
    /// # Errors
    /// - `VocabError::EmptyQueue` if nothing was playable
    /// - `VocabError::Exhausted` once the cursor ran past the last target
    pub fn current(&self) -> Result<&Label, VocabError> {
        if self.targets.is_empty() {
            return Err(VocabError::EmptyQueue);
        }
        self.targets.get(self.cursor).ok_or(VocabError::Exhausted {
            cursor: self.cursor,
            len: self.targets.len(),
        })
    }

    /// Move to the next target
    ///
    /// May run past the end; callers check [`TargetQueue::is_exhausted`].
    #[inline]
    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Current cursor position
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of targets in this playthrough
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// True once every target has been consumed
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.targets.len()
    }

    /// Targets left including the current one
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.targets.len().saturating_sub(self.cursor)
    }

    /// The full shuffled sequence
    #[inline]
    #[must_use]
    pub fn targets(&self) -> &[Label] {
        &self.targets
    }
}
