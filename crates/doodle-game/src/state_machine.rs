use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Menu,
    Loading,
    Countdown,
    Playing,
    End,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Menu => "menu",
            Phase::Loading => "loading",
            Phase::Countdown => "countdown",
            Phase::Playing => "playing",
            Phase::End => "end",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates a phase change.
///
/// Staying in the same phase is not a transition and is always allowed.
pub fn validate_transition(from: Phase, to: Phase) -> Result<(), SessionError> {
    if from == to || allowed(from, to) {
        Ok(())
    } else {
        Err(SessionError::IllegalTransition { from, to })
    }
}

pub fn allowed_transitions(from: Phase) -> Vec<Phase> {
    use Phase::*;
    match from {
        // Menu -> Countdown directly when the classifier is already loaded
        Menu => vec![Loading, Countdown],
        // Loading -> Menu on load failure or an empty vocabulary
        Loading => vec![Countdown, Menu],
        // Countdown -> Menu when the classifier worker is lost
        Countdown => vec![Playing, Menu],
        // Playing -> Menu on exit, End on timeout or exhausted queue
        Playing => vec![End, Menu],
        End => vec![Countdown, Menu],
    }
}

fn allowed(from: Phase, to: Phase) -> bool {
    allowed_transitions(from).into_iter().any(|p| p == to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_is_closed() {
        assert!(validate_transition(Phase::Menu, Phase::Loading).is_ok());
        assert!(validate_transition(Phase::Loading, Phase::Countdown).is_ok());
        assert!(validate_transition(Phase::Countdown, Phase::Playing).is_ok());
        assert!(validate_transition(Phase::Playing, Phase::End).is_ok());
        assert!(validate_transition(Phase::End, Phase::Countdown).is_ok());
        assert!(validate_transition(Phase::End, Phase::Menu).is_ok());
    }

    #[test]
    fn shortcuts_are_rejected() {
        assert_eq!(
            validate_transition(Phase::Menu, Phase::Playing),
            Err(SessionError::IllegalTransition {
                from: Phase::Menu,
                to: Phase::Playing
            })
        );
        assert!(validate_transition(Phase::Countdown, Phase::End).is_err());
        assert!(validate_transition(Phase::Loading, Phase::Playing).is_err());
    }

    #[test]
    fn every_active_phase_can_fall_back_to_menu() {
        for from in [Phase::Loading, Phase::Countdown, Phase::Playing, Phase::End] {
            assert!(validate_transition(from, Phase::Menu).is_ok(), "{from}");
        }
    }
}
