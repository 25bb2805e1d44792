//! Assist ("easy mode") scoring
//!
//! Post-processes raw classifier output before the session compares it with
//! the prompt. The longer the player has been drawing, the more of the
//! model's top-ranked wrong guesses are suppressed, so the prompt climbs the
//! ranking if the model considered it at all. The prompt itself is never
//! suppressed and never inserted.
//!
//! # Algorithm
//! 1. Drop banned labels.
//! 2. `over = time_spent - reject_time_delay`. Nothing else happens unless
//!    `over > 0` and the top score exceeds `start_reject_threshold`.
//! 3. `amount = over / reject_time_per_label`. Ranks `i < amount + 1` other
//!    than the target are zeroed when `amount > i`, otherwise scaled by
//!    `i - amount`.
//! 4. Stable re-sort, then renormalize to a distribution.

use crate::config::{AssistConfig, GameConfig};
use doodle_classifier::ClassificationResult;
use doodle_vocab::{BannedLabels, Label};
use std::time::Duration;

/// Classification post-processor
#[derive(Debug, Clone)]
pub struct AssistScorer {
    config: AssistConfig,
    banned: BannedLabels,
}

impl AssistScorer {
    /// Create a scorer
    #[inline]
    #[must_use]
    pub fn new(config: AssistConfig, banned: BannedLabels) -> Self {
        Self { config, banned }
    }

    /// Scorer using a game config's assist tuning and ban list
    #[must_use]
    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.assist, config.banned())
    }

    /// Filter, adjust and renormalize a raw result
    ///
    /// The output sums to 1.0 unless it is empty. If suppression leaves
    /// nothing with a positive score, the adjustment is discarded; if the
    /// filtered scores are all zero to begin with, the output is uniform.
    #[must_use]
    pub fn score(
        &self,
        raw: ClassificationResult,
        time_spent: Duration,
        target: Option<&Label>,
    ) -> ClassificationResult {
        let mut result = raw;
        result.retain(|p| !self.banned.contains(p.label.as_str()));

        if let Some(amount) = self.suppression_amount(&result, time_spent) {
            let unadjusted = result.clone();
            suppress(&mut result, amount, target);
            result.sort_descending();

            if normalize(&mut result) {
                return result;
            }
            tracing::debug!(amount, "Suppression zeroed every score, keeping raw ranking");
            result = unadjusted;
        }

        result.sort_descending();
        if !normalize(&mut result) {
            uniform(&mut result);
        }
        result
    }

    /// Ranks to suppress, or `None` when assist does not apply yet
    fn suppression_amount(&self, result: &ClassificationResult, time_spent: Duration) -> Option<f64> {
        let over = time_spent.checked_sub(self.config.reject_time_delay())?;
        if over.is_zero() {
            return None;
        }
        let top = result.top()?;
        if top.score <= self.config.start_reject_threshold {
            return None;
        }
        Some(over.as_secs_f64() / self.config.reject_time_per_label().as_secs_f64())
    }
}

fn suppress(result: &mut ClassificationResult, amount: f64, target: Option<&Label>) {
    for (i, prediction) in result.predictions_mut().iter_mut().enumerate() {
        let rank = i as f64;
        if rank >= amount + 1.0 {
            break;
        }
        if target.is_some_and(|t| prediction.label == *t) {
            continue;
        }
        if amount > rank {
            prediction.score = 0.0;
        } else {
            prediction.score *= rank - amount;
        }
    }
}

/// Divide by the total; false if the total is not a positive finite number
fn normalize(result: &mut ClassificationResult) -> bool {
    let total = result.total();
    if !(total.is_finite() && total > 0.0) {
        return false;
    }
    for p in result.predictions_mut() {
        p.score /= total;
    }
    true
}

fn uniform(result: &mut ClassificationResult) {
    let n = result.len();
    if n == 0 {
        return;
    }
    let share = 1.0 / n as f64;
    for p in result.predictions_mut() {
        p.score = share;
    }
}
