//! Session-side classifier handle
//!
//! Sends requests without blocking and turns incoming events into typed
//! [`Delivery`] values. The client correlates request ids; it does not know
//! about rounds or targets.
//!
//! # Caller obligation
//!
//! At most one `classify` may be outstanding. The client records the
//! outstanding id ([`ClassifierClient::in_flight`]) but does not refuse a
//! second request: gating is the session's job. A response whose id no
//! longer matches is reported as [`Delivery::Stale`].

use crate::error::ClientError;
use crate::protocol::{ClassifierEvent, Request, RequestId};
use crate::raster::Raster;
use crate::result::ClassificationResult;
use doodle_vocab::Label;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Model load lifecycle as seen by the client
#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadState {
    Unloaded,
    Loading,
    Ready(Vec<Label>),
    Failed(String),
}

/// Immediate answer to [`ClassifierClient::load`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Already loaded; here is the vocabulary
    Ready(Vec<Label>),
    /// Readiness will arrive later as an event
    Pending,
}

/// An event after correlation
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Model is loaded
    Ready(Vec<Label>),
    /// Model failed to load; the session cannot proceed
    LoadFailed(String),
    /// Output for the outstanding request
    Classified {
        request_id: RequestId,
        result: ClassificationResult,
    },
    /// The outstanding request failed
    ClassifyFailed { request_id: RequestId, message: String },
    /// Response to a request that is no longer outstanding
    Stale { request_id: RequestId },
}

/// Handle to a classifier worker
#[derive(Debug)]
pub struct ClassifierClient {
    requests: mpsc::Sender<Request>,
    load_state: LoadState,
    next_request_id: u64,
    in_flight: Option<RequestId>,
}

impl ClassifierClient {
    /// Wrap the request end of a worker channel
    #[must_use]
    pub fn new(requests: mpsc::Sender<Request>) -> Self {
        Self {
            requests,
            load_state: LoadState::Unloaded,
            next_request_id: 0,
            in_flight: None,
        }
    }

    /// Request the model, idempotently
    ///
    /// # Errors
    /// `ClientError` if the load request could not be queued.
    pub fn load(&mut self) -> Result<LoadStatus, ClientError> {
        match &self.load_state {
            LoadState::Ready(labels) => Ok(LoadStatus::Ready(labels.clone())),
            LoadState::Loading => Ok(LoadStatus::Pending),
            LoadState::Unloaded | LoadState::Failed(_) => {
                self.send(Request::Load)?;
                self.load_state = LoadState::Loading;
                tracing::info!("Requested classifier load");
                Ok(LoadStatus::Pending)
            }
        }
    }

    /// Send a sketch for classification
    ///
    /// # Errors
    /// - `ClientError::NotReady` before the model reported ready
    /// - `ClientError::ChannelClosed` / `Backpressure` if the request could
    ///   not be queued
    pub fn classify(&mut self, image: Raster) -> Result<RequestId, ClientError> {
        if !self.is_ready() {
            return Err(ClientError::NotReady);
        }
        if let Some(outstanding) = self.in_flight {
            tracing::warn!(
                "classify issued while {} is still in flight; the older response will be stale",
                outstanding
            );
        }

        let request_id = RequestId(self.next_request_id);
        self.send(Request::Classify { request_id, image })?;
        self.next_request_id += 1;
        self.in_flight = Some(request_id);
        Ok(request_id)
    }

    /// Correlate an incoming event with client state
    pub fn accept(&mut self, event: ClassifierEvent) -> Delivery {
        match event {
            ClassifierEvent::Ready { labels } => {
                self.load_state = LoadState::Ready(labels.clone());
                Delivery::Ready(labels)
            }
            ClassifierEvent::LoadFailed { message } => {
                self.load_state = LoadState::Failed(message.clone());
                Delivery::LoadFailed(message)
            }
            ClassifierEvent::Result { request_id, data } => {
                if self.settle(request_id) {
                    Delivery::Classified {
                        request_id,
                        result: ClassificationResult::from_ranked(data),
                    }
                } else {
                    Delivery::Stale { request_id }
                }
            }
            ClassifierEvent::Error {
                request_id,
                message,
            } => {
                if self.settle(request_id) {
                    Delivery::ClassifyFailed {
                        request_id,
                        message,
                    }
                } else {
                    Delivery::Stale { request_id }
                }
            }
        }
    }

    /// Ask the worker to stop; later requests fail with `ChannelClosed`
    pub fn shutdown(&mut self) {
        if self.send(Request::Shutdown).is_err() {
            tracing::debug!("Classifier worker already gone at shutdown");
        }
    }

    /// Forget the worker after its event channel closed
    ///
    /// Drops the in-flight slot and marks the model failed, so the next
    /// `load` tries the channel again and reports `ChannelClosed`.
    pub fn disconnect(&mut self) {
        if let Some(request_id) = self.in_flight.take() {
            tracing::warn!("Classifier worker lost with {} in flight", request_id);
        }
        self.load_state = LoadState::Failed(ClientError::ChannelClosed.to_string());
    }

    /// Model reported ready
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.load_state, LoadState::Ready(_))
    }

    /// Load request sent, no answer yet
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.load_state, LoadState::Loading)
    }

    /// Vocabulary, once loaded
    #[must_use]
    pub fn labels(&self) -> Option<&[Label]> {
        match &self.load_state {
            LoadState::Ready(labels) => Some(labels),
            _ => None,
        }
    }

    /// Message from the last failed load
    #[must_use]
    pub fn load_error(&self) -> Option<&str> {
        match &self.load_state {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Outstanding classify request
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    fn settle(&mut self, request_id: RequestId) -> bool {
        if self.in_flight == Some(request_id) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    fn send(&self, request: Request) -> Result<(), ClientError> {
        self.requests.try_send(request).map_err(|e| match e {
            TrySendError::Full(_) => ClientError::Backpressure,
            TrySendError::Closed(_) => ClientError::ChannelClosed,
        })
    }
}
