//! Error types for the game session
//!
//! Mirrors the failure taxonomy of a playthrough:
//! - setup failures (classifier unavailable, nothing playable) end the
//!   attempt and send the player back to the menu
//! - illegal commands are rejected and leave the state untouched
//! - transient inference failures and stale responses never surface here;
//!   the session logs and absorbs them

use crate::state_machine::Phase;
use doodle_classifier::ClientError;
use doodle_vocab::VocabError;

/// Main session error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Command not valid in the current phase
    #[error("{command} is not allowed while in {from}")]
    IllegalCommand { from: Phase, command: &'static str },

    /// Phase change outside the transition table
    #[error("illegal transition {from} -> {to}")]
    IllegalTransition { from: Phase, to: Phase },

    /// Classifier failed to load
    #[error("classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// Request could not reach the classifier worker
    #[error("classifier client error: {0}")]
    Client(#[from] ClientError),

    /// Target queue problem (nothing playable)
    #[error("vocabulary error: {0}")]
    Vocabulary(#[from] VocabError),
}

impl SessionError {
    /// Whether the player can keep going without restarting
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::IllegalCommand { .. } => true,
            Self::Client(ClientError::Backpressure) => true,
            Self::IllegalTransition { .. }
            | Self::ClassifierUnavailable(_)
            | Self::Client(_)
            | Self::Vocabulary(_) => false,
        }
    }

    /// Whether this should be shown to the player
    #[inline]
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::ClassifierUnavailable(_) | Self::Vocabulary(_) | Self::Client(ClientError::ChannelClosed)
        )
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::GameConfig`]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parse but make no sense
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
