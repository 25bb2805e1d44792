//! Classifier worker task
//!
//! Runs in its own tokio task and shares nothing with the session but the
//! two channels. Requests are served strictly in arrival order, so events
//! come back in the order their requests were sent.

use crate::classifier::Classifier;
use crate::client::ClassifierClient;
use crate::error::ClassifierError;
use crate::protocol::{ClassifierEvent, Request, RequestId};
use crate::raster::Raster;
use doodle_vocab::Label;
use tokio::sync::mpsc;

/// Spawn a worker around `classifier` and return the session-side ends
///
/// `capacity` bounds both channels. Must be called inside a tokio runtime.
pub fn spawn_worker<C>(
    classifier: C,
    capacity: usize,
) -> (ClassifierClient, mpsc::Receiver<ClassifierEvent>)
where
    C: Classifier,
{
    let (request_tx, request_rx) = mpsc::channel(capacity);
    let (event_tx, event_rx) = mpsc::channel(capacity);

    tokio::spawn(worker_task(classifier, request_rx, event_tx));

    (ClassifierClient::new(request_tx), event_rx)
}

/// Worker loop (runs in separate tokio task)
async fn worker_task<C>(
    mut classifier: C,
    mut requests: mpsc::Receiver<Request>,
    events: mpsc::Sender<ClassifierEvent>,
) where
    C: Classifier,
{
    let mut vocabulary: Option<Vec<Label>> = None;

    while let Some(request) = requests.recv().await {
        let event = match request {
            Request::Load => match ensure_loaded(&mut classifier, &mut vocabulary).await {
                Ok(labels) => ClassifierEvent::Ready {
                    labels: labels.to_vec(),
                },
                Err(e) => {
                    tracing::error!("Classifier load failed: {}", e);
                    ClassifierEvent::LoadFailed {
                        message: e.to_string(),
                    }
                }
            },
            Request::Classify { request_id, image } => {
                match classify(&mut classifier, &mut vocabulary, &image).await {
                    Ok(data) => ClassifierEvent::Result { request_id, data },
                    Err(e) => {
                        tracing::warn!("Classification {} failed: {}", request_id, e);
                        classify_error(request_id, &e)
                    }
                }
            }
            Request::Shutdown => break,
        };

        if events.send(event).await.is_err() {
            // Session dropped its receiver
            break;
        }
    }

    tracing::debug!("Classifier worker stopped");
}

/// Load once; later calls reuse the cached vocabulary
async fn ensure_loaded<'v, C>(
    classifier: &mut C,
    vocabulary: &'v mut Option<Vec<Label>>,
) -> Result<&'v [Label], ClassifierError>
where
    C: Classifier,
{
    if vocabulary.is_none() {
        let labels = classifier.load().await?;
        tracing::info!("Classifier loaded with {} labels", labels.len());
        *vocabulary = Some(labels);
    }
    Ok(vocabulary.as_deref().unwrap_or_default())
}

async fn classify<C>(
    classifier: &mut C,
    vocabulary: &mut Option<Vec<Label>>,
    image: &Raster,
) -> Result<Vec<crate::result::Prediction>, ClassifierError>
where
    C: Classifier,
{
    // A classify that arrives before any load request loads lazily
    ensure_loaded(classifier, vocabulary).await?;
    let gray = image.alpha_channel()?;
    classifier.classify(&gray).await
}

fn classify_error(request_id: RequestId, error: &ClassifierError) -> ClassifierEvent {
    ClassifierEvent::Error {
        request_id,
        message: error.to_string(),
    }
}
