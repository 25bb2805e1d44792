//! Banned label filtering

use crate::label::Label;
use indexmap::IndexSet;

/// Labels excluded from play by default
///
/// Each is either too similar to another label, too hard to draw, too hard
/// to understand, or ambiguous.
pub const DEFAULT_BANNED_LABELS: &[&str] = &[
    "animal migration",
    "arm",
    "barn",
    "bat",
    "brain",
    "coffee cup",
    "circle",
    "hexagon",
    "stitches",
    "sweather",
    "van",
];

/// Set of labels that must never be used as a prompt or a guess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannedLabels {
    labels: IndexSet<Label>,
}

impl BannedLabels {
    /// Create from any label source
    pub fn new<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Ban nothing
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self {
            labels: IndexSet::new(),
        }
    }

    /// Check whether a label is banned
    #[inline]
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Number of banned labels
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True if nothing is banned
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate banned labels in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }
}

impl Default for BannedLabels {
    fn default() -> Self {
        Self::new(DEFAULT_BANNED_LABELS.iter().copied())
    }
}

/// Drop every banned label, keeping the input order
///
/// Pure; an empty vocabulary yields an empty result.
pub fn filter_labels<'a, I>(labels: I, banned: &BannedLabels) -> Vec<Label>
where
    I: IntoIterator<Item = &'a Label>,
{
    labels
        .into_iter()
        .filter(|label| !banned.contains(label.as_str()))
        .cloned()
        .collect()
}
