//! Doodle Vocab - label vocabulary handling
//!
//! The leaves of the game:
//! - [`Label`] identifiers drawn from the classifier's vocabulary
//! - [`BannedLabels`] and the order-preserving [`filter_labels`]
//! - [`TargetQueue`], the shuffled prompt sequence for one playthrough
//!
//! # Example
//!
//! ```rust
//! use doodle_vocab::{BannedLabels, Label, TargetQueue};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let vocabulary: Vec<Label> = ["cat", "dog", "bat"].into_iter().map(Label::from).collect();
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut queue = TargetQueue::build(&vocabulary, &BannedLabels::default(), &mut rng);
//!
//! assert_eq!(queue.len(), 2); // "bat" is banned by default
//! let first = queue.current().unwrap().clone();
//! queue.advance();
//! assert_ne!(queue.current().unwrap(), &first);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod filter;
pub mod label;
pub mod queue;

pub use error::VocabError;
pub use filter::{filter_labels, BannedLabels, DEFAULT_BANNED_LABELS};
pub use label::Label;
pub use queue::TargetQueue;
