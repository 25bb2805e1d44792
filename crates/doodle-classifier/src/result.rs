//! Ranked classification output

use doodle_vocab::Label;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One `(label, score)` pair from the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    pub score: f64,
}

impl Prediction {
    /// Create a prediction
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<Label>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1}%)", self.label, 100.0 * self.score)
    }
}

/// Predictions sorted by descending score
///
/// Construction sanitizes scores: NaN, infinite and negative values become
/// `0.0`, so a malformed model output can only lose information, never
/// poison later arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationResult(Vec<Prediction>);

impl ClassificationResult {
    /// Sanitize and stably sort raw model output
    #[must_use]
    pub fn from_ranked(mut predictions: Vec<Prediction>) -> Self {
        for p in &mut predictions {
            if !p.score.is_finite() || p.score < 0.0 {
                p.score = 0.0;
            }
        }
        let mut result = Self(predictions);
        result.sort_descending();
        result
    }

    /// Highest scoring prediction
    #[inline]
    #[must_use]
    pub fn top(&self) -> Option<&Prediction> {
        self.0.first()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prediction> {
        self.0.iter()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Prediction] {
        &self.0
    }

    /// Mutable access for post-processing; callers re-sort afterwards
    #[inline]
    pub fn predictions_mut(&mut self) -> &mut [Prediction] {
        &mut self.0
    }

    /// Keep only predictions matching `keep`
    pub fn retain(&mut self, keep: impl FnMut(&Prediction) -> bool) {
        self.0.retain(keep);
    }

    /// Stable descending sort; equal scores keep their relative order
    pub fn sort_descending(&mut self) {
        self.0.sort_by(|a, b| b.score.total_cmp(&a.score));
    }

    /// Sum of all scores
    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.iter().map(|p| p.score).sum()
    }

    /// Score of a given label, if present
    #[must_use]
    pub fn score_of(&self, label: &str) -> Option<f64> {
        self.0.iter().find(|p| p.label == *label).map(|p| p.score)
    }
}

impl FromIterator<Prediction> for ClassificationResult {
    fn from_iter<T: IntoIterator<Item = Prediction>>(iter: T) -> Self {
        Self::from_ranked(iter.into_iter().collect())
    }
}
