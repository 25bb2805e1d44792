//! Error types for the classifier boundary
//!
//! Two sides, two enums:
//! - [`ClassifierError`]: failures inside the worker (model load, inference,
//!   malformed input). These travel back as protocol events.
//! - [`ClientError`]: failures sending a request from the session side.

/// Worker-side failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifierError {
    /// Model could not be loaded (network, missing weights, bad config)
    #[error("model load failed: {0}")]
    LoadFailed(String),

    /// A single inference call failed
    #[error("inference failed: {0}")]
    Inference(String),

    /// Raster buffer does not match its declared dimensions
    #[error("malformed raster: expected {expected} bytes, got {actual}")]
    MalformedRaster { expected: usize, actual: usize },
}

impl ClassifierError {
    /// Whether the session can carry on after this error
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::LoadFailed(_))
    }
}

/// Client-side send failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Worker task has stopped
    #[error("classifier worker is gone")]
    ChannelClosed,

    /// Request queue is full
    #[error("classifier request queue is full")]
    Backpressure,

    /// `classify` was called before the model reported ready
    #[error("classifier is not ready")]
    NotReady,
}
