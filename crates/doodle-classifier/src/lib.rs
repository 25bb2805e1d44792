//! Doodle Classifier - out-of-process sketch classification
//!
//! The classifier model lives in its own tokio task and is reached only
//! through FIFO message channels:
//! - [`protocol`]: the tagged request/event messages on the wire
//! - [`worker`]: the task that owns a [`Classifier`] and answers requests
//! - [`client`]: the session-side handle that sends requests and correlates
//!   events with what it asked for
//!
//! # Example
//!
//! ```rust,ignore
//! use doodle_classifier::{spawn_worker, Delivery, LoadStatus};
//!
//! let (mut client, mut events) = spawn_worker(my_classifier, 16);
//! assert_eq!(client.load()?, LoadStatus::Pending);
//!
//! let event = events.recv().await.unwrap();
//! if let Delivery::Ready(labels) = client.accept(event) {
//!     println!("{} labels", labels.len());
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod classifier;
pub mod client;
pub mod error;
pub mod protocol;
pub mod raster;
pub mod result;
pub mod worker;

pub use classifier::Classifier;
pub use client::{ClassifierClient, Delivery, LoadStatus};
pub use error::{ClassifierError, ClientError};
pub use protocol::{ClassifierEvent, Request, RequestId};
pub use raster::{GrayImage, Raster};
pub use result::{ClassificationResult, Prediction};
pub use worker::spawn_worker;
