use doodle_classifier::{Prediction, Raster};
use doodle_vocab::Label;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a round was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    /// Classifier's top guess matched the prompt
    Correct,
    /// Player skipped the prompt
    Skipped,
    /// Playthrough ran out of time on this prompt
    TimedOut,
}

/// Record of one resolved round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionLogEntry {
    pub target: Label,
    /// Top-1 guess shown when the round was resolved
    pub output: Option<Prediction>,
    /// Sketch at resolution time
    pub image: Option<Raster>,
    pub correct: bool,
    pub outcome: RoundOutcome,
    /// Round clock (including skip penalties) at resolution
    pub elapsed_ms: u64,
}

impl PredictionLogEntry {
    pub fn new(
        target: Label,
        output: Option<Prediction>,
        image: Option<Raster>,
        outcome: RoundOutcome,
        elapsed: Duration,
    ) -> Self {
        Self {
            target,
            output,
            image,
            correct: outcome == RoundOutcome::Correct,
            outcome,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Append-only record of a playthrough
///
/// Entries are never edited; the log is only emptied when the next
/// playthrough starts.
#[derive(Debug, Clone, Default)]
pub struct PredictionLog {
    entries: Vec<PredictionLogEntry>,
}

impl PredictionLog {
    /// Append an entry and return its index
    pub fn append(&mut self, entry: PredictionLogEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn entries(&self) -> &[PredictionLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&PredictionLogEntry> {
        self.entries.last()
    }

    /// Number of correctly guessed prompts
    pub fn score(&self) -> usize {
        self.entries.iter().filter(|e| e.correct).count()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// End-of-game summary without images
    pub fn summary(&self) -> GameSummary {
        let count = |outcome: RoundOutcome| self.entries.iter().filter(|e| e.outcome == outcome).count();
        GameSummary {
            rounds: self.entries.len(),
            correct: count(RoundOutcome::Correct),
            skipped: count(RoundOutcome::Skipped),
            timed_out: count(RoundOutcome::TimedOut),
            results: self
                .entries
                .iter()
                .map(|e| RoundSummary {
                    target: e.target.clone(),
                    guess: e.output.clone(),
                    outcome: e.outcome,
                    elapsed_ms: e.elapsed_ms,
                })
                .collect(),
        }
    }
}

/// Playthrough totals for the end screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub rounds: usize,
    pub correct: usize,
    pub skipped: usize,
    pub timed_out: usize,
    pub results: Vec<RoundSummary>,
}

impl GameSummary {
    pub fn generate_text(&self) -> String {
        let mut out = format!(
            "Score: {}/{} (skipped {}, timed out {})\n",
            self.correct, self.rounds, self.skipped, self.timed_out
        );
        for (i, round) in self.results.iter().enumerate() {
            let guess = round
                .guess
                .as_ref()
                .map_or_else(|| "no guess".to_string(), ToString::to_string);
            let mark = match round.outcome {
                RoundOutcome::Correct => "ok",
                RoundOutcome::Skipped => "skip",
                RoundOutcome::TimedOut => "time",
            };
            out.push_str(&format!(
                "  {:>2}. [{:<4}] {:<16} {:>6.1}s  {}\n",
                i + 1,
                mark,
                round.target.as_str(),
                round.elapsed_ms as f64 / 1000.0,
                guess
            ));
        }
        out
    }
}

/// One row of the summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub target: Label,
    pub guess: Option<Prediction>,
    pub outcome: RoundOutcome,
    pub elapsed_ms: u64,
}
