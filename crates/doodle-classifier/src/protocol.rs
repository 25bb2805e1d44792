//! Wire messages between the session and the classifier worker
//!
//! Both directions are tagged unions: requests carry an `action` tag,
//! events carry a `status` tag. Every `classify` request gets exactly one
//! `result` or `error` event with the same [`RequestId`].

use crate::raster::Raster;
use crate::result::Prediction;
use doodle_vocab::Label;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlation id for a `classify` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Session to worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    /// Load the model and report its vocabulary
    Load,
    /// Classify one sketch
    Classify { request_id: RequestId, image: Raster },
    /// Stop the worker
    Shutdown,
}

/// Worker to session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClassifierEvent {
    /// Model loaded
    Ready { labels: Vec<Label> },
    /// Model failed to load
    LoadFailed { message: String },
    /// Ranked output for a classify request
    Result {
        request_id: RequestId,
        data: Vec<Prediction>,
    },
    /// Classify request failed
    Error {
        request_id: RequestId,
        message: String,
    },
}
