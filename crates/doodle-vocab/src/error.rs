//! Error types for vocabulary handling

/// Target queue errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VocabError {
    /// The playable vocabulary was empty after filtering
    #[error("target queue is empty")]
    EmptyQueue,

    /// The cursor ran past the last shuffled target
    #[error("target queue exhausted (cursor {cursor}, {len} targets)")]
    Exhausted { cursor: usize, len: usize },
}
