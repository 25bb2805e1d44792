//! Read-only view of a session for whatever renders it

use crate::canvas::Canvas;
use crate::session::GameSession;
use crate::state_machine::Phase;
use doodle_classifier::Prediction;
use doodle_vocab::Label;
use serde::Serialize;
use std::time::Duration;

/// What the screen shows right now
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub phase: Phase,
    pub target: Option<Label>,
    /// `MM:SS` time left while playing
    pub clock: Option<String>,
    pub countdown: Option<u32>,
    /// Top-1 guess, e.g. `cat (87.5%)`
    pub prediction: Option<String>,
    pub predicting: bool,
    pub score: usize,
    pub rounds: usize,
    pub error: Option<String>,
}

impl HudSnapshot {
    /// Capture the display state of a session
    pub fn capture<C: Canvas>(session: &GameSession<C>) -> Self {
        Self {
            phase: session.phase(),
            target: session.current_target().cloned(),
            clock: session.time_remaining().map(format_clock),
            countdown: session.countdown_remaining(),
            prediction: session
                .output()
                .and_then(|o| o.top())
                .map(Prediction::to_string),
            predicting: session.is_predicting(),
            score: session.log().score(),
            rounds: session.log().len(),
            error: session
                .last_error()
                .filter(|e| e.is_user_visible())
                .map(ToString::to_string),
        }
    }
}

impl Default for HudSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Menu,
            target: None,
            clock: None,
            countdown: None,
            prediction: None,
            predicting: false,
            score: 0,
            rounds: 0,
            error: None,
        }
    }
}

/// Format remaining time as `MM:SS`, rounding down to the whole second
#[must_use]
pub fn format_clock(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
