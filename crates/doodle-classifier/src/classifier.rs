//! The model seam
//!
//! Anything that turns an image into a ranked list of labels. The worker
//! owns exactly one implementation and is the only caller.

use crate::error::ClassifierError;
use crate::raster::GrayImage;
use crate::result::Prediction;
use doodle_vocab::Label;

/// Image classification capability
#[async_trait::async_trait]
pub trait Classifier: Send + 'static {
    /// Load the model and return its full label vocabulary
    ///
    /// Called at most once successfully; the worker caches the vocabulary.
    async fn load(&mut self) -> Result<Vec<Label>, ClassifierError>;

    /// Score an image against every label
    ///
    /// Output order does not matter; the client re-ranks it.
    async fn classify(&mut self, image: &GrayImage) -> Result<Vec<Prediction>, ClassifierError>;
}

#[async_trait::async_trait]
impl<C> Classifier for Box<C>
where
    C: Classifier + ?Sized,
{
    async fn load(&mut self) -> Result<Vec<Label>, ClassifierError> {
        (**self).load().await
    }

    async fn classify(&mut self, image: &GrayImage) -> Result<Vec<Prediction>, ClassifierError> {
        (**self).classify(image).await
    }
}
