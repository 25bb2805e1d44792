//! Seeded end-to-end simulator
//!
//! Plays a whole game without a screen: a [`SimulatedArtist`] draws on a
//! [`SimulatedCanvas`] and a [`SimulatedClassifier`] recognises the sketch
//! the more strokes it has. All three share one [`Sketch`]. The session
//! itself is the real one, driven by the real [`SessionDriver`], so a run
//! exercises every timer, the classifier protocol and the assist scorer.
//!
//! Runs are reproducible for a given seed when the tokio clock is paused.

use crate::canvas::Canvas;
use crate::config::GameConfig;
use crate::driver::{Command, DriverHandle, SessionDriver};
use crate::prediction_log::GameSummary;
use crate::session::GameSession;
use crate::state_machine::Phase;
use anyhow::Context;
use doodle_classifier::{spawn_worker, Classifier, ClassifierError, GrayImage, Prediction, Raster};
use doodle_vocab::Label;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Vocabulary of the simulated model, banned entries included
pub const DEMO_VOCABULARY: &[&str] = &[
    "airplane", "apple", "bat", "bicycle", "bird", "cat", "circle", "clock", "cloud", "dog",
    "fish", "flower", "hexagon", "house", "moon", "pizza", "star", "sun", "tree", "umbrella",
];

/// Side length of the simulated canvas
const CANVAS_SIZE: u32 = 28;

/// Worker channel depth
const WORKER_CAPACITY: usize = 16;

/// Drawing time before the artist gives up on a prompt
const PATIENCE: Duration = Duration::from_secs(12);

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// How quickly the artist's sketches become recognisable, 0..=1
    pub skill: f64,
    /// Classifier inference latency
    pub latency: Duration,
    /// Make the classifier fail to load
    pub fail_load: bool,
    pub game: GameConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            skill: 0.5,
            latency: Duration::from_millis(40),
            fail_load: false,
            game: GameConfig::default(),
        }
    }
}

/// Final report from simulator
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorReport {
    pub seed: u64,
    pub final_phase: Phase,
    pub strokes: u64,
    pub error: Option<String>,
    pub summary: GameSummary,
}

impl SimulatorReport {
    /// The game reached its end screen
    #[must_use]
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.final_phase == Phase::End
    }

    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = format!(
            "Seed {}: finished in {} after {} strokes\n",
            self.seed, self.final_phase, self.strokes
        );
        if let Some(error) = &self.error {
            out.push_str(&format!("Error: {error}\n"));
        }
        out.push_str(&self.summary.generate_text());
        out
    }
}

/// Play one full game
///
/// # Errors
/// Fails only if the driver task panics.
pub async fn run_simulator(config: SimulatorConfig) -> anyhow::Result<SimulatorReport> {
    let sketch = Sketch::shared();
    let vocabulary: Vec<Label> = DEMO_VOCABULARY.iter().copied().map(Label::from).collect();

    let classifier = SimulatedClassifier::new(vocabulary, Arc::clone(&sketch), config.seed)
        .with_latency(config.latency)
        .failing_load(config.fail_load);
    let (client, events) = spawn_worker(classifier, WORKER_CAPACITY);

    let canvas = SimulatedCanvas::new(Arc::clone(&sketch));
    let session = GameSession::new(config.game.clone(), client, canvas)
        .with_rng(StdRng::seed_from_u64(config.seed));
    let (driver, handle) = SessionDriver::new(session, events);
    let driver = tokio::spawn(driver.run());

    let artist = SimulatedArtist::new(handle, sketch, config.seed.wrapping_add(1), config.skill);
    let strokes = artist.play().await;

    let session = driver.await.context("session driver panicked")?;
    tracing::info!("Simulation finished in {}", session.phase());

    Ok(SimulatorReport {
        seed: config.seed,
        final_phase: session.phase(),
        strokes,
        error: session.last_error().map(ToString::to_string),
        summary: session.log().summary(),
    })
}

/// What is on the simulated canvas
#[derive(Debug, Default)]
pub struct Sketch {
    strokes: u32,
    /// How recognisable the drawing is, 0..=1
    clarity: f64,
    subject: Option<Label>,
    started: Option<Instant>,
}

impl Sketch {
    #[must_use]
    pub fn shared() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::default()))
    }

    fn stroke(&mut self, subject: &Label, gain: f64) {
        if self.subject.as_ref() != Some(subject) {
            self.subject = Some(subject.clone());
            self.clarity = 0.0;
        }
        self.strokes += 1;
        self.clarity = (self.clarity + gain).min(1.0);
        self.started.get_or_insert_with(Instant::now);
    }
}

/// Canvas backed by a shared [`Sketch`]
#[derive(Debug, Clone)]
pub struct SimulatedCanvas {
    sketch: Arc<Mutex<Sketch>>,
}

impl SimulatedCanvas {
    #[must_use]
    pub fn new(sketch: Arc<Mutex<Sketch>>) -> Self {
        Self { sketch }
    }
}

impl Canvas for SimulatedCanvas {
    fn canvas_data(&self) -> Option<Raster> {
        let sketch = self.sketch.lock();
        if sketch.strokes == 0 {
            return None;
        }
        // One inked pixel per stroke, RGBA with ink in the alpha channel
        let pixels = (CANVAS_SIZE * CANVAS_SIZE) as usize;
        let inked = (sketch.strokes as usize).min(pixels);
        let mut data = vec![0u8; pixels * 4];
        for px in data.chunks_exact_mut(4).take(inked) {
            px[3] = 255;
        }
        Some(Raster::new(CANVAS_SIZE, CANVAS_SIZE, data))
    }

    fn clear(&mut self, reset: bool) {
        let mut sketch = self.sketch.lock();
        sketch.strokes = 0;
        sketch.clarity = 0.0;
        sketch.subject = None;
        if reset {
            sketch.started = None;
        }
    }

    fn time_spent_drawing(&self) -> Duration {
        self.sketch
            .lock()
            .started
            .map_or(Duration::ZERO, |started| started.elapsed())
    }
}

/// Model that peeks at the shared sketch
pub struct SimulatedClassifier {
    vocabulary: Vec<Label>,
    sketch: Arc<Mutex<Sketch>>,
    rng: StdRng,
    latency: Duration,
    fail_load: bool,
}

impl SimulatedClassifier {
    #[must_use]
    pub fn new(vocabulary: Vec<Label>, sketch: Arc<Mutex<Sketch>>, seed: u64) -> Self {
        Self {
            vocabulary,
            sketch,
            rng: StdRng::seed_from_u64(seed),
            latency: Duration::ZERO,
            fail_load: false,
        }
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[must_use]
    pub fn failing_load(mut self, fail: bool) -> Self {
        self.fail_load = fail;
        self
    }
}

#[async_trait::async_trait]
impl Classifier for SimulatedClassifier {
    async fn load(&mut self) -> Result<Vec<Label>, ClassifierError> {
        tokio::time::sleep(self.latency * 10).await;
        if self.fail_load {
            return Err(ClassifierError::LoadFailed("simulated model missing".to_string()));
        }
        Ok(self.vocabulary.clone())
    }

    async fn classify(&mut self, image: &GrayImage) -> Result<Vec<Prediction>, ClassifierError> {
        tokio::time::sleep(self.latency).await;
        let (subject, clarity) = {
            let sketch = self.sketch.lock();
            (sketch.subject.clone(), sketch.clarity)
        };
        if image.inked_pixels() == 0 {
            return Ok(Vec::new());
        }

        let predictions = self
            .vocabulary
            .iter()
            .map(|label| {
                let score = if subject.as_ref() == Some(label) {
                    clarity + self.rng.random_range(0.0..0.2)
                } else {
                    self.rng.random_range(0.0..0.4)
                };
                Prediction::new(label.clone(), score)
            })
            .collect();
        Ok(predictions)
    }
}

/// Player stand-in
pub struct SimulatedArtist {
    handle: DriverHandle,
    sketch: Arc<Mutex<Sketch>>,
    rng: StdRng,
    skill: f64,
}

impl SimulatedArtist {
    #[must_use]
    pub fn new(handle: DriverHandle, sketch: Arc<Mutex<Sketch>>, seed: u64, skill: f64) -> Self {
        Self {
            handle,
            sketch,
            rng: StdRng::seed_from_u64(seed),
            skill: skill.clamp(0.0, 1.0),
        }
    }

    /// Press start and draw until the end screen; returns strokes drawn
    pub async fn play(mut self) -> u64 {
        let mut strokes = 0;
        if !self.handle.send(Command::Start).await {
            return strokes;
        }

        let mut hud = self.handle.subscribe();
        let mut drawing: Option<(Label, Instant)> = None;

        loop {
            let snapshot = hud.borrow_and_update().clone();
            match (snapshot.phase, snapshot.target) {
                (Phase::End, _) => break,
                (Phase::Menu, _) if snapshot.error.is_some() => {
                    tracing::info!("Artist gives up: {}", snapshot.error.unwrap_or_default());
                    break;
                }
                (Phase::Playing, Some(target)) => {
                    if !matches!(&drawing, Some((current, _)) if *current == target) {
                        drawing = Some((target.clone(), Instant::now()));
                    }
                    let since = drawing.as_ref().map_or_else(Instant::now, |(_, since)| *since);

                    if since.elapsed() > PATIENCE {
                        tracing::debug!("Artist skips {:?}", target.as_str());
                        drawing = None;
                        if !self.handle.send(Command::Skip).await {
                            break;
                        }
                        let moved_on = hud
                            .wait_for(|h| h.phase != Phase::Playing || h.target.as_ref() != Some(&target))
                            .await;
                        if moved_on.is_err() {
                            break;
                        }
                        continue;
                    }

                    let pause = Duration::from_millis(self.rng.random_range(150..500));
                    tokio::time::sleep(pause).await;
                    let gain = self.skill * self.rng.random_range(0.02..0.12);
                    self.sketch.lock().stroke(&target, gain);
                    strokes += 1;
                    if !self.handle.send(Command::SketchChanged).await {
                        break;
                    }
                }
                _ => {
                    if hud.changed().await.is_err() {
                        break;
                    }
                }
            }
        }
        strokes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_is_empty_until_first_stroke() {
        let sketch = Sketch::shared();
        let canvas = SimulatedCanvas::new(Arc::clone(&sketch));
        assert!(canvas.canvas_data().is_none());

        sketch.lock().stroke(&Label::from("cat"), 0.1);
        let raster = canvas.canvas_data().unwrap();
        assert_eq!(raster.alpha_channel().unwrap().inked_pixels(), 1);
    }

    #[test]
    fn new_subject_resets_clarity() {
        let mut sketch = Sketch::default();
        sketch.stroke(&Label::from("cat"), 0.5);
        sketch.stroke(&Label::from("cat"), 0.3);
        assert!((sketch.clarity - 0.8).abs() < 1e-9);

        sketch.stroke(&Label::from("dog"), 0.1);
        assert!((sketch.clarity - 0.1).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_without_reset_keeps_drawing_timer() {
        let sketch = Sketch::shared();
        let mut canvas = SimulatedCanvas::new(Arc::clone(&sketch));
        sketch.lock().stroke(&Label::from("cat"), 0.1);
        tokio::time::advance(Duration::from_secs(2)).await;

        canvas.clear(false);
        assert_eq!(canvas.time_spent_drawing(), Duration::from_secs(2));

        canvas.clear(true);
        assert_eq!(canvas.time_spent_drawing(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn simulator_plays_to_the_end() {
        let report = run_simulator(SimulatorConfig {
            seed: 7,
            ..SimulatorConfig::default()
        })
        .await
        .unwrap();

        assert!(report.passed(), "{}", report.generate_text());
        assert!(report.summary.rounds > 0);
        assert!(report.strokes > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn simulator_reports_load_failure() {
        let report = run_simulator(SimulatorConfig {
            fail_load: true,
            ..SimulatorConfig::default()
        })
        .await
        .unwrap();

        assert!(!report.passed());
        assert_eq!(report.final_phase, Phase::Menu);
        assert!(report.error.unwrap().contains("simulated model missing"));
    }
}
