//! Testing utilities for the Doodle Rush workspace
//!
//! Shared fakes for the two collaborators a session talks to.

#![allow(missing_docs)]

use doodle_classifier::{Classifier, ClassifierError, GrayImage, Prediction, Raster};
use doodle_game::Canvas;
use doodle_vocab::Label;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

pub fn labels(names: &[&str]) -> Vec<Label> {
    names.iter().copied().map(Label::from).collect()
}

pub fn ranked(pairs: &[(&str, f64)]) -> Vec<Prediction> {
    pairs.iter().map(|(l, s)| Prediction::new(*l, *s)).collect()
}

#[derive(Debug)]
struct CanvasState {
    raster: Option<Raster>,
    time_spent: Duration,
    clears: Vec<bool>,
}

/// Canvas whose contents the test sets by hand
///
/// Clones share state, so a test can keep one while the session owns the
/// other.
#[derive(Debug, Clone)]
pub struct FakeCanvas {
    state: Arc<Mutex<CanvasState>>,
}

impl FakeCanvas {
    /// Canvas holding a small inked sketch
    pub fn new() -> Self {
        let mut data = vec![0u8; 4 * 4 * 4];
        data[3] = 255;
        Self::with_raster(Some(Raster::new(4, 4, data)))
    }

    pub fn with_raster(raster: Option<Raster>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CanvasState {
                raster,
                time_spent: Duration::ZERO,
                clears: Vec::new(),
            })),
        }
    }

    pub fn set_time_spent(&self, time_spent: Duration) {
        self.state.lock().time_spent = time_spent;
    }

    /// `reset` flag of every clear so far
    pub fn clears(&self) -> Vec<bool> {
        self.state.lock().clears.clone()
    }
}

impl Default for FakeCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas for FakeCanvas {
    fn canvas_data(&self) -> Option<Raster> {
        self.state.lock().raster.clone()
    }

    fn clear(&mut self, reset: bool) {
        let mut state = self.state.lock();
        state.clears.push(reset);
        if reset {
            state.time_spent = Duration::ZERO;
        }
    }

    fn time_spent_drawing(&self) -> Duration {
        self.state.lock().time_spent
    }
}

/// Classifier that replays canned responses in order
///
/// Once the script runs out every image gets an empty ranking.
#[derive(Debug, Clone)]
pub struct ScriptedClassifier {
    vocabulary: Result<Vec<Label>, String>,
    script: Arc<Mutex<VecDeque<Result<Vec<Prediction>, ClassifierError>>>>,
    calls: Arc<Mutex<usize>>,
}

impl ScriptedClassifier {
    pub fn new(vocabulary: Vec<Label>) -> Self {
        Self {
            vocabulary: Ok(vocabulary),
            script: Arc::default(),
            calls: Arc::default(),
        }
    }

    /// Classifier whose load always fails
    pub fn failing(message: &str) -> Self {
        Self {
            vocabulary: Err(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    /// Queue a response; clones share the script
    pub fn push(&self, response: Result<Vec<Prediction>, ClassifierError>) -> &Self {
        self.script.lock().push_back(response);
        self
    }

    /// Images classified so far
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait::async_trait]
impl Classifier for ScriptedClassifier {
    async fn load(&mut self) -> Result<Vec<Label>, ClassifierError> {
        self.vocabulary.clone().map_err(ClassifierError::LoadFailed)
    }

    async fn classify(&mut self, _image: &GrayImage) -> Result<Vec<Prediction>, ClassifierError> {
        *self.calls.lock() += 1;
        self.script.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Classifier that loads fine and never answers a classify request
#[derive(Debug, Clone)]
pub struct StalledClassifier {
    vocabulary: Vec<Label>,
    calls: Arc<Mutex<usize>>,
}

impl StalledClassifier {
    pub fn new(vocabulary: Vec<Label>) -> Self {
        Self {
            vocabulary,
            calls: Arc::default(),
        }
    }

    /// Classify requests received so far
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait::async_trait]
impl Classifier for StalledClassifier {
    async fn load(&mut self) -> Result<Vec<Label>, ClassifierError> {
        Ok(self.vocabulary.clone())
    }

    async fn classify(&mut self, _image: &GrayImage) -> Result<Vec<Prediction>, ClassifierError> {
        *self.calls.lock() += 1;
        std::future::pending().await
    }
}

/// Classifier that loads fine and panics on the first image
#[derive(Debug, Clone)]
pub struct PanickingClassifier {
    vocabulary: Vec<Label>,
}

impl PanickingClassifier {
    pub fn new(vocabulary: Vec<Label>) -> Self {
        Self { vocabulary }
    }
}

#[async_trait::async_trait]
impl Classifier for PanickingClassifier {
    async fn load(&mut self) -> Result<Vec<Label>, ClassifierError> {
        Ok(self.vocabulary.clone())
    }

    async fn classify(&mut self, image: &GrayImage) -> Result<Vec<Prediction>, ClassifierError> {
        panic!("model crashed on a {}x{} sketch", image.width, image.height)
    }
}
