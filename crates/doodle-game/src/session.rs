//! Game session state machine
//!
//! One object owns everything a playthrough needs: the phase, the clocks,
//! the target queue, the prediction log and the classifier client. All
//! input, whether player commands, timer ticks or classifier events, goes
//! through [`GameSession::transition`], so there is exactly one place where
//! ordering hazards are resolved.
//!
//! # Stale results
//!
//! A classify request remembers the target index it was issued for. A result
//! is applied only if it answers the outstanding request *and* the cursor has
//! not moved since; anything else is dropped without touching the log.

use crate::assist::AssistScorer;
use crate::canvas::Canvas;
use crate::config::GameConfig;
use crate::error::SessionError;
use crate::prediction_log::{PredictionLog, PredictionLogEntry, RoundOutcome};
use crate::state_machine::{validate_transition, Phase};
use doodle_classifier::{
    ClassificationResult, ClassifierClient, ClassifierEvent, ClientError, Delivery, LoadStatus,
    RequestId,
};
use doodle_vocab::{Label, TargetQueue, VocabError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::time::Instant;

/// Everything that can happen to a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Player pressed start on the menu
    StartRequested,
    /// Message from the classifier worker
    Classifier(ClassifierEvent),
    /// One countdown second elapsed
    CountdownTick { now: Instant },
    /// Classification refresh interval elapsed
    RefreshTick { now: Instant },
    /// Canvas reported a stroke
    SketchChanged,
    /// Player wiped the canvas
    ClearRequested,
    /// Player gave up on the current prompt
    Skip,
    /// Player left the game
    Exit,
    /// "Play again" on the end screen
    PlayAgain,
    /// "Quit" on the end screen
    Quit,
    /// Classifier worker stopped answering (task ended or panicked)
    ClassifierDisconnected,
}

impl SessionEvent {
    /// Short name for logs and errors
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartRequested => "start",
            Self::Classifier(_) => "classifier event",
            Self::CountdownTick { .. } => "countdown tick",
            Self::RefreshTick { .. } => "refresh tick",
            Self::SketchChanged => "sketch change",
            Self::ClearRequested => "clear",
            Self::Skip => "skip",
            Self::Exit => "exit",
            Self::PlayAgain => "play again",
            Self::Quit => "quit",
            Self::ClassifierDisconnected => "classifier disconnect",
        }
    }
}

/// Phase plus the data that only exists in that phase
#[derive(Debug, Clone)]
pub enum SessionState {
    Menu,
    Loading,
    Countdown { remaining: u32 },
    Playing(PlayState),
    End,
}

impl SessionState {
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Menu => Phase::Menu,
            Self::Loading => Phase::Loading,
            Self::Countdown { .. } => Phase::Countdown,
            Self::Playing(_) => Phase::Playing,
            Self::End => Phase::End,
        }
    }
}

/// Outstanding classify request and the prompt it was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingClassify {
    request_id: RequestId,
    target_index: usize,
}

/// Clock and classification state while playing
#[derive(Debug, Clone)]
pub struct PlayState {
    started_at: Instant,
    now: Instant,
    penalty: Duration,
    sketch_changed: bool,
    output: Option<ClassificationResult>,
    pending: Option<PendingClassify>,
}

impl PlayState {
    fn new(now: Instant) -> Self {
        Self {
            started_at: now,
            now,
            penalty: Duration::ZERO,
            sketch_changed: false,
            output: None,
            pending: None,
        }
    }

    /// Playthrough clock at the last tick, skip penalties included
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.now.saturating_duration_since(self.started_at) + self.penalty
    }

    /// When play started
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Accumulated skip penalty
    #[must_use]
    pub fn penalty(&self) -> Duration {
        self.penalty
    }

    /// Stroke seen since the last refresh tick
    #[must_use]
    pub fn sketch_changed(&self) -> bool {
        self.sketch_changed
    }

    /// Latest scored classification for the current prompt
    #[must_use]
    pub fn output(&self) -> Option<&ClassificationResult> {
        self.output.as_ref()
    }

    /// Whether a result for the current prompt is still expected
    #[must_use]
    pub fn awaiting_result(&self) -> bool {
        self.pending.is_some()
    }
}

/// The game session
pub struct GameSession<C> {
    config: GameConfig,
    scorer: AssistScorer,
    client: ClassifierClient,
    canvas: C,
    rng: StdRng,
    state: SessionState,
    queue: TargetQueue,
    log: PredictionLog,
    last_error: Option<SessionError>,
}

impl<C> GameSession<C>
where
    C: Canvas,
{
    /// Create a session in the menu
    #[must_use]
    pub fn new(config: GameConfig, client: ClassifierClient, canvas: C) -> Self {
        Self {
            scorer: AssistScorer::from_config(&config),
            config,
            client,
            canvas,
            rng: StdRng::from_os_rng(),
            state: SessionState::Menu,
            queue: TargetQueue::from_ordered(Vec::new()),
            log: PredictionLog::default(),
            last_error: None,
        }
    }

    /// Use a fixed random source for target shuffling
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Feed one event through the state machine
    ///
    /// Returns the phase after the event.
    ///
    /// # Errors
    /// - `SessionError::IllegalCommand` for a player command that makes no
    ///   sense in the current phase; nothing changes
    /// - setup failures (`ClassifierUnavailable`, `Vocabulary`, `Client`):
    ///   the session is back in the menu and the error is also kept in
    ///   [`GameSession::last_error`]
    pub fn transition(&mut self, event: SessionEvent) -> Result<Phase, SessionError> {
        let from = self.phase();
        let command = event.name();

        let result = match event {
            SessionEvent::StartRequested => self.on_start(),
            SessionEvent::Classifier(event) => self.on_classifier(event),
            SessionEvent::CountdownTick { now } => self.on_countdown_tick(now),
            SessionEvent::RefreshTick { now } => self.on_refresh_tick(now),
            SessionEvent::SketchChanged => {
                if let SessionState::Playing(play) = &mut self.state {
                    play.sketch_changed = true;
                }
                Ok(())
            }
            SessionEvent::ClearRequested => {
                self.require(Phase::Playing, command)?;
                self.canvas.clear(false);
                Ok(())
            }
            SessionEvent::Skip => {
                self.require(Phase::Playing, command)?;
                self.resolve_round(RoundOutcome::Skipped)
            }
            SessionEvent::Exit => match from {
                Phase::Playing => self.finish(SessionState::Menu),
                Phase::Loading => self.enter(SessionState::Menu),
                _ => Err(SessionError::IllegalCommand { from, command }),
            },
            SessionEvent::PlayAgain => {
                self.require(Phase::End, command)?;
                self.play_again()
            }
            SessionEvent::ClassifierDisconnected => self.on_disconnected(),
            SessionEvent::Quit => {
                self.require(Phase::End, command)?;
                self.enter(SessionState::Menu)
            }
        };

        let to = self.phase();
        if from != to {
            tracing::info!("Session {} -> {} on {}", from, to, command);
        }
        result.map(|()| to)
    }

    /// Current phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Prediction log of the current or last playthrough
    #[inline]
    #[must_use]
    pub fn log(&self) -> &PredictionLog {
        &self.log
    }

    /// Target queue of the current or last playthrough
    #[inline]
    #[must_use]
    pub fn queue(&self) -> &TargetQueue {
        &self.queue
    }

    /// Prompt being drawn (or about to be, during the countdown)
    #[must_use]
    pub fn current_target(&self) -> Option<&Label> {
        match self.state {
            SessionState::Countdown { .. } | SessionState::Playing(_) => self.queue.current().ok(),
            _ => None,
        }
    }

    /// Play clock, while playing
    #[must_use]
    pub fn play_state(&self) -> Option<&PlayState> {
        match &self.state {
            SessionState::Playing(play) => Some(play),
            _ => None,
        }
    }

    /// Latest scored classification for the current prompt
    #[must_use]
    pub fn output(&self) -> Option<&ClassificationResult> {
        self.play_state().and_then(PlayState::output)
    }

    /// Countdown ticks left, during the countdown
    #[must_use]
    pub fn countdown_remaining(&self) -> Option<u32> {
        match self.state {
            SessionState::Countdown { remaining } => Some(remaining),
            _ => None,
        }
    }

    /// Play time left, while playing
    #[must_use]
    pub fn time_remaining(&self) -> Option<Duration> {
        self.play_state()
            .map(|play| self.config.game_duration().saturating_sub(play.elapsed()))
    }

    /// A classify request is outstanding at the worker
    #[inline]
    #[must_use]
    pub fn is_predicting(&self) -> bool {
        self.client.in_flight().is_some()
    }

    /// Last setup failure, cleared on the next start
    #[inline]
    #[must_use]
    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn client(&self) -> &ClassifierClient {
        &self.client
    }

    #[inline]
    #[must_use]
    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    /// Stop the classifier worker
    pub fn shutdown(&mut self) {
        self.client.shutdown();
    }

    fn on_start(&mut self) -> Result<(), SessionError> {
        let from = self.phase();
        if !matches!(from, Phase::Menu | Phase::Loading) {
            return Err(SessionError::IllegalCommand {
                from,
                command: "start",
            });
        }
        self.last_error = None;

        match self.client.load() {
            Ok(LoadStatus::Ready(labels)) => self.begin_countdown(&labels),
            Ok(LoadStatus::Pending) => self.enter(SessionState::Loading),
            Err(e) => self.fail_setup(SessionError::Client(e)),
        }
    }

    fn on_classifier(&mut self, event: ClassifierEvent) -> Result<(), SessionError> {
        let phase = self.phase();
        match self.client.accept(event) {
            Delivery::Ready(labels) => {
                if phase == Phase::Loading {
                    self.begin_countdown(&labels)
                } else {
                    tracing::debug!("Classifier ready while in {}", phase);
                    Ok(())
                }
            }
            Delivery::LoadFailed(message) => {
                if phase == Phase::Loading {
                    self.fail_setup(SessionError::ClassifierUnavailable(message))
                } else {
                    tracing::warn!("Classifier load failed while in {}: {}", phase, message);
                    Ok(())
                }
            }
            Delivery::Classified { request_id, result } => {
                self.on_classified(request_id, result)
            }
            Delivery::ClassifyFailed {
                request_id,
                message,
            } => {
                // Missed tick; the next change retries
                tracing::warn!("Classification {} failed: {}", request_id, message);
                if let SessionState::Playing(play) = &mut self.state {
                    if play.pending.is_some_and(|p| p.request_id == request_id) {
                        play.pending = None;
                    }
                }
                Ok(())
            }
            Delivery::Stale { request_id } => {
                tracing::debug!("Discarding uncorrelated response {}", request_id);
                Ok(())
            }
        }
    }

    fn on_classified(
        &mut self,
        request_id: RequestId,
        result: ClassificationResult,
    ) -> Result<(), SessionError> {
        let SessionState::Playing(play) = &mut self.state else {
            tracing::debug!("Discarding result {} outside of play", request_id);
            return Ok(());
        };

        let cursor = self.queue.cursor();
        match play.pending {
            Some(p) if p.request_id == request_id && p.target_index == cursor => {
                play.pending = None;
            }
            _ => {
                tracing::debug!("Discarding stale result {} (target index {})", request_id, cursor);
                return Ok(());
            }
        }

        let target = self.queue.current().ok();
        let scored = self
            .scorer
            .score(result, self.canvas.time_spent_drawing(), target);
        let hit = matches!((scored.top(), target), (Some(top), Some(t)) if top.label == *t);
        play.output = Some(scored);

        if hit {
            self.resolve_round(RoundOutcome::Correct)
        } else {
            Ok(())
        }
    }

    fn on_countdown_tick(&mut self, now: Instant) -> Result<(), SessionError> {
        let SessionState::Countdown { remaining } = &mut self.state else {
            tracing::debug!("Ignoring countdown tick in {}", self.state.phase());
            return Ok(());
        };

        *remaining = remaining.saturating_sub(1);
        if *remaining > 0 {
            return Ok(());
        }

        self.log.clear();
        self.enter(SessionState::Playing(PlayState::new(now)))?;
        if let Ok(target) = self.queue.current() {
            tracing::info!("Play started, first prompt {:?}", target.as_str());
        }
        Ok(())
    }

    fn on_refresh_tick(&mut self, now: Instant) -> Result<(), SessionError> {
        let SessionState::Playing(play) = &mut self.state else {
            return Ok(());
        };

        if play.sketch_changed && self.client.in_flight().is_none() {
            if let Some(image) = self.canvas.canvas_data() {
                match self.client.classify(image) {
                    Ok(request_id) => {
                        play.pending = Some(PendingClassify {
                            request_id,
                            target_index: self.queue.cursor(),
                        });
                    }
                    Err(e) => tracing::warn!("Skipping classification this tick: {}", e),
                }
            }
        }
        play.sketch_changed = false;
        play.now = now;

        if play.elapsed() > self.config.game_duration() {
            tracing::info!("Time is up after {:?}", play.elapsed());
            self.time_out()
        } else {
            Ok(())
        }
    }

    /// Log the current prompt and move to the next (correct answer or skip)
    fn resolve_round(&mut self, outcome: RoundOutcome) -> Result<(), SessionError> {
        let SessionState::Playing(play) = &mut self.state else {
            return Err(SessionError::IllegalCommand {
                from: self.state.phase(),
                command: "resolve round",
            });
        };

        let elapsed = play.elapsed();
        if outcome != RoundOutcome::Correct {
            play.penalty += self.config.skip_penalty();
        }
        let output = play.output.take().and_then(|o| o.top().cloned());
        play.sketch_changed = false;
        // A response still in flight now belongs to the previous prompt
        play.pending = None;

        let target = self.queue.current()?.clone();
        tracing::info!("Prompt {:?} resolved: {:?}", target.as_str(), outcome);
        self.log.append(PredictionLogEntry::new(
            target,
            output,
            self.canvas.canvas_data(),
            outcome,
            elapsed,
        ));
        self.queue.advance();
        self.canvas.clear(true);

        if self.queue.is_exhausted() {
            tracing::info!("All {} prompts used, ending playthrough", self.queue.len());
            return self.finish(SessionState::End);
        }
        Ok(())
    }

    /// Playthrough ran out of time; the unanswered prompt counts as missed
    fn time_out(&mut self) -> Result<(), SessionError> {
        let SessionState::Playing(play) = &mut self.state else {
            return Ok(());
        };
        let elapsed = play.elapsed();
        let output = play.output.take().and_then(|o| o.top().cloned());

        if let Ok(target) = self.queue.current() {
            self.log.append(PredictionLogEntry::new(
                target.clone(),
                output,
                self.canvas.canvas_data(),
                RoundOutcome::TimedOut,
                elapsed,
            ));
        }
        self.finish(SessionState::End)
    }

    fn play_again(&mut self) -> Result<(), SessionError> {
        match self.client.load() {
            Ok(LoadStatus::Ready(labels)) => self.begin_countdown(&labels),
            Ok(LoadStatus::Pending) => self.fail_setup(SessionError::ClassifierUnavailable(
                "classifier is reloading".to_string(),
            )),
            Err(e) => self.fail_setup(SessionError::Client(e)),
        }
    }

    /// Worker is gone: nothing in flight will ever answer, so leave any
    /// active playthrough and keep the error for the player
    fn on_disconnected(&mut self) -> Result<(), SessionError> {
        self.client.disconnect();
        let error = SessionError::Client(ClientError::ChannelClosed);
        match self.phase() {
            Phase::Playing => {
                self.canvas.clear(true);
                self.fail_setup(error)
            }
            Phase::Loading | Phase::Countdown => self.fail_setup(error),
            Phase::Menu | Phase::End => {
                tracing::error!("Classifier worker lost: {}", error);
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    fn begin_countdown(&mut self, labels: &[Label]) -> Result<(), SessionError> {
        let queue = TargetQueue::build(labels, &self.config.banned(), &mut self.rng);
        if queue.is_empty() {
            return self.fail_setup(SessionError::Vocabulary(VocabError::EmptyQueue));
        }
        self.queue = queue;
        self.enter(SessionState::Countdown {
            remaining: self.config.countdown_ticks,
        })
    }

    /// Leave play: wipe the canvas, then move on
    fn finish(&mut self, next: SessionState) -> Result<(), SessionError> {
        self.canvas.clear(true);
        self.enter(next)
    }

    /// Report a failure and return to the menu
    fn fail_setup(&mut self, error: SessionError) -> Result<(), SessionError> {
        tracing::error!("Returning to menu: {}", error);
        self.last_error = Some(error.clone());
        self.enter(SessionState::Menu)?;
        Err(error)
    }

    fn enter(&mut self, next: SessionState) -> Result<(), SessionError> {
        validate_transition(self.phase(), next.phase())?;
        self.state = next;
        Ok(())
    }

    fn require(&self, phase: Phase, command: &'static str) -> Result<(), SessionError> {
        let from = self.phase();
        if from == phase {
            Ok(())
        } else {
            Err(SessionError::IllegalCommand { from, command })
        }
    }
}

impl<C> std::fmt::Debug for GameSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("state", &self.state)
            .field("cursor", &self.queue.cursor())
            .field("log_len", &self.log.len())
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}
