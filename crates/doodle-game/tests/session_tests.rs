//! Session state machine scenarios, driven event by event

use doodle_classifier::{ClassifierClient, ClassifierEvent, ClientError, Request, RequestId};
use doodle_game::{GameConfig, GameSession, Phase, RoundOutcome, SessionError, SessionEvent};
use doodle_test_utils::{labels, ranked, FakeCanvas};
use doodle_vocab::{Label, VocabError};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

struct Harness {
    session: GameSession<FakeCanvas>,
    requests: mpsc::Receiver<Request>,
    canvas: FakeCanvas,
    now: Instant,
}

impl Harness {
    fn new(config: GameConfig) -> Self {
        let (tx, requests) = mpsc::channel(16);
        let canvas = FakeCanvas::new();
        let session = GameSession::new(config, ClassifierClient::new(tx), canvas.clone())
            .with_rng(StdRng::seed_from_u64(11));
        Self {
            session,
            requests,
            canvas,
            now: Instant::now(),
        }
    }

    fn event(&mut self, event: SessionEvent) -> Result<Phase, SessionError> {
        self.session.transition(event)
    }

    fn classifier(&mut self, event: ClassifierEvent) -> Result<Phase, SessionError> {
        self.event(SessionEvent::Classifier(event))
    }

    /// Start, load `vocabulary`, count down into play
    fn play(&mut self, vocabulary: &[&str]) {
        assert_eq!(self.event(SessionEvent::StartRequested).unwrap(), Phase::Loading);
        assert!(matches!(self.requests.try_recv(), Ok(Request::Load)));
        assert_eq!(
            self.classifier(ClassifierEvent::Ready {
                labels: labels(vocabulary)
            })
            .unwrap(),
            Phase::Countdown
        );
        self.count_down();
    }

    fn count_down(&mut self) {
        for remaining in (1..=3).rev() {
            assert_eq!(self.session.countdown_remaining(), Some(remaining));
            self.event(SessionEvent::CountdownTick { now: self.now }).unwrap();
        }
        assert_eq!(self.session.phase(), Phase::Playing);
    }

    fn tick(&mut self, step: Duration) -> Phase {
        self.now += step;
        self.event(SessionEvent::RefreshTick { now: self.now }).unwrap()
    }

    /// Stroke, refresh, and return the classify request that went out
    fn draw(&mut self) -> Option<RequestId> {
        self.event(SessionEvent::SketchChanged).unwrap();
        self.tick(Duration::from_millis(10));
        let mut issued = None;
        while let Ok(request) = self.requests.try_recv() {
            if let Request::Classify { request_id, .. } = request {
                assert!(issued.is_none(), "more than one classify per tick");
                issued = Some(request_id);
            }
        }
        issued
    }

    fn respond(&mut self, request_id: RequestId, pairs: &[(&str, f64)]) -> Phase {
        self.classifier(ClassifierEvent::Result {
            request_id,
            data: ranked(pairs),
        })
        .unwrap()
    }

    /// Drop the worker's end of the request channel and report it gone
    fn lose_worker(&mut self) -> Result<Phase, SessionError> {
        drop(std::mem::replace(&mut self.requests, mpsc::channel(1).1));
        self.event(SessionEvent::ClassifierDisconnected)
    }

    fn target(&self) -> Label {
        self.session.current_target().cloned().unwrap()
    }

    /// Some vocabulary entry other than the current target
    fn other(&self, vocabulary: &[&'static str]) -> &'static str {
        let target = self.target();
        vocabulary.iter().copied().find(|l| target != **l).unwrap()
    }
}

const PAIR: &[&str] = &["cat", "dog"];

#[test]
fn confident_correct_guess_advances_immediately() {
    let mut h = Harness::new(GameConfig::default());
    h.play(PAIR);
    let first = h.target();
    let other = h.other(PAIR);

    let id = h.draw().unwrap();
    assert_eq!(h.respond(id, &[(first.as_str(), 0.9), (other, 0.05)]), Phase::Playing);

    assert_eq!(h.session.queue().cursor(), 1);
    assert_eq!(h.target(), other);
    let entry = h.session.log().last().unwrap();
    assert_eq!(entry.target, first);
    assert!(entry.correct);
    assert_eq!(entry.output.as_ref().unwrap().label, first);
    assert_eq!(h.canvas.clears(), vec![true]);
    assert!(h.session.output().is_none());
}

#[test]
fn assist_lifts_target_after_long_drawing() {
    const TRIO: &[&str] = &["cat", "dog", "bird"];
    let mut h = Harness::new(GameConfig::default());
    h.play(TRIO);
    let target = h.target();
    let others: Vec<&str> = TRIO.iter().copied().filter(|l| target != *l).collect();

    h.canvas.set_time_spent(Duration::from_millis(5000));
    let id = h.draw().unwrap();
    h.respond(id, &[(others[0], 0.8), (target.as_str(), 0.1), (others[1], 0.1)]);

    let entry = h.session.log().last().unwrap();
    assert_eq!(entry.target, target);
    assert!(entry.correct);
    let guess = entry.output.as_ref().unwrap();
    assert!((guess.score - 0.5).abs() < 1e-9);
}

#[test]
fn wrong_guess_is_shown_but_not_logged() {
    let mut h = Harness::new(GameConfig::default());
    h.play(PAIR);
    let other = h.other(PAIR);

    let id = h.draw().unwrap();
    h.respond(id, &[(other, 0.7), (h.target().as_str(), 0.3)]);

    assert_eq!(h.session.output().unwrap().top().unwrap().label, other);
    assert!(h.session.log().is_empty());
    assert_eq!(h.session.queue().cursor(), 0);
}

#[test]
fn skip_applies_penalty_and_logs_miss() {
    const FOUR: &[&str] = &["cat", "dog", "sun", "tree"];
    let mut h = Harness::new(GameConfig::default());
    h.play(FOUR);

    let id = h.draw().unwrap();
    let first = h.target();
    let other = h.other(FOUR);
    h.respond(id, &[(first.as_str(), 0.9), (other, 0.1)]);
    let prior = h.session.log().entries().to_vec();

    h.tick(Duration::from_secs(1));
    let before = h.session.time_remaining().unwrap();
    let skipped = h.target();
    assert_eq!(h.event(SessionEvent::Skip).unwrap(), Phase::Playing);

    assert_eq!(h.session.queue().cursor(), 2);
    assert_eq!(h.session.time_remaining().unwrap(), before - Duration::from_secs(3));
    assert_eq!(h.session.log().len(), 2);
    assert_eq!(&h.session.log().entries()[..1], &prior[..]);

    let entry = h.session.log().last().unwrap();
    assert_eq!(entry.target, skipped);
    assert_eq!(entry.outcome, RoundOutcome::Skipped);
    assert!(!entry.correct);
}

#[test]
fn late_response_for_previous_target_is_dropped() {
    const TRIO: &[&str] = &["cat", "dog", "bird"];
    let mut h = Harness::new(GameConfig::default());
    h.play(TRIO);
    let first = h.target();

    let id = h.draw().unwrap();
    h.event(SessionEvent::Skip).unwrap();
    assert_eq!(h.session.queue().cursor(), 1);

    // Answer for the skipped prompt, which also happens to be the new top
    let current = h.target();
    h.respond(id, &[(current.as_str(), 0.9), (first.as_str(), 0.1)]);

    assert_eq!(h.session.queue().cursor(), 1);
    assert_eq!(h.session.log().len(), 1);
    assert_eq!(h.session.log().last().unwrap().outcome, RoundOutcome::Skipped);
    assert!(h.session.output().is_none());
}

#[test]
fn one_request_in_flight_at_a_time() {
    let mut h = Harness::new(GameConfig::default());
    h.play(PAIR);

    let id = h.draw().unwrap();
    assert_eq!(h.draw(), None);
    assert_eq!(h.draw(), None);
    assert!(h.session.is_predicting());

    h.respond(id, &[(h.other(PAIR), 0.9)]);
    assert!(!h.session.is_predicting());
    assert!(h.draw().is_some());
}

#[test]
fn unchanged_sketch_is_not_resent() {
    let mut h = Harness::new(GameConfig::default());
    h.play(PAIR);

    let id = h.draw().unwrap();
    h.respond(id, &[(h.other(PAIR), 0.9)]);

    h.tick(Duration::from_millis(10));
    assert!(h.requests.try_recv().is_err());
}

#[test]
fn failed_classification_frees_the_slot() {
    let mut h = Harness::new(GameConfig::default());
    h.play(PAIR);

    let id = h.draw().unwrap();
    h.classifier(ClassifierEvent::Error {
        request_id: id,
        message: "inference blew up".into(),
    })
    .unwrap();

    assert_eq!(h.session.phase(), Phase::Playing);
    assert!(h.session.log().is_empty());
    assert!(h.draw().is_some());
}

#[test]
fn time_out_ends_playthrough() {
    let mut h = Harness::new(GameConfig::default());
    h.play(PAIR);
    let target = h.target();

    assert_eq!(h.tick(Duration::from_millis(60_500)), Phase::Playing);
    assert_eq!(h.tick(Duration::from_millis(10)), Phase::End);

    let entry = h.session.log().last().unwrap();
    assert_eq!(entry.target, target);
    assert_eq!(entry.outcome, RoundOutcome::TimedOut);
    assert_eq!(h.canvas.clears(), vec![true]);
    assert!(h.session.time_remaining().is_none());
}

#[test]
fn skip_penalty_can_end_the_game_early() {
    let config = GameConfig::default().with_game_duration(Duration::from_secs(5));
    let mut h = Harness::new(config);
    h.play(&["cat", "dog", "sun", "tree"]);

    h.event(SessionEvent::Skip).unwrap();
    h.event(SessionEvent::Skip).unwrap();
    assert_eq!(h.tick(Duration::from_millis(10)), Phase::End);
    assert_eq!(h.session.log().summary().skipped, 2);
    assert_eq!(h.session.log().summary().timed_out, 1);
}

#[test]
fn exhausted_queue_ends_playthrough() {
    let mut h = Harness::new(GameConfig::default());
    h.play(PAIR);

    for _ in 0..2 {
        let id = h.draw().unwrap();
        let target = h.target();
        h.respond(id, &[(target.as_str(), 0.95)]);
    }

    assert_eq!(h.session.phase(), Phase::End);
    assert!(h.session.queue().is_exhausted());
    assert_eq!(h.session.log().score(), 2);
}

#[test]
fn exit_returns_to_menu_without_logging() {
    let mut h = Harness::new(GameConfig::default());
    h.play(PAIR);
    let id = h.draw().unwrap();

    assert_eq!(h.event(SessionEvent::Exit).unwrap(), Phase::Menu);
    assert!(h.session.log().is_empty());

    // The answer arrives after leaving; nothing happens
    h.respond(id, &[(PAIR[0], 0.9)]);
    assert_eq!(h.session.phase(), Phase::Menu);
    assert!(h.session.log().is_empty());
}

#[test]
fn play_again_reshuffles_and_resets_log() {
    let mut h = Harness::new(GameConfig::default());
    h.play(PAIR);
    h.tick(Duration::from_secs(61));
    assert_eq!(h.session.phase(), Phase::End);
    assert_eq!(h.session.log().len(), 1);

    assert_eq!(h.event(SessionEvent::PlayAgain).unwrap(), Phase::Countdown);
    // Log survives the countdown so the end screen data is not lost early
    assert_eq!(h.session.log().len(), 1);
    assert_eq!(h.session.queue().cursor(), 0);
    h.count_down();
    assert!(h.session.log().is_empty());
}

#[test]
fn quit_from_end_screen() {
    let mut h = Harness::new(GameConfig::default());
    h.play(PAIR);
    h.tick(Duration::from_secs(61));

    assert_eq!(h.event(SessionEvent::Quit).unwrap(), Phase::Menu);
}

#[test]
fn load_failure_returns_to_menu() {
    let mut h = Harness::new(GameConfig::default());
    h.event(SessionEvent::StartRequested).unwrap();

    let err = h
        .classifier(ClassifierEvent::LoadFailed {
            message: "weights missing".into(),
        })
        .unwrap_err();

    assert!(matches!(err, SessionError::ClassifierUnavailable(ref m) if m == "weights missing"));
    assert_eq!(h.session.phase(), Phase::Menu);
    assert_eq!(h.session.last_error(), Some(&err));
}

#[test]
fn fully_banned_vocabulary_cannot_start() {
    let mut h = Harness::new(GameConfig::default());
    h.event(SessionEvent::StartRequested).unwrap();

    let err = h
        .classifier(ClassifierEvent::Ready {
            labels: labels(&["bat", "hexagon"]),
        })
        .unwrap_err();

    assert_eq!(err, SessionError::Vocabulary(VocabError::EmptyQueue));
    assert_eq!(h.session.phase(), Phase::Menu);
}

#[test]
fn second_start_skips_loading_once_ready() {
    let mut h = Harness::new(GameConfig::default());
    h.play(PAIR);
    h.event(SessionEvent::Exit).unwrap();

    assert_eq!(h.event(SessionEvent::StartRequested).unwrap(), Phase::Countdown);
    assert!(h.requests.try_recv().is_err());
}

#[test]
fn late_ready_after_leaving_loading_is_kept() {
    let mut h = Harness::new(GameConfig::default());
    assert_eq!(h.event(SessionEvent::StartRequested).unwrap(), Phase::Loading);
    assert!(matches!(h.requests.try_recv(), Ok(Request::Load)));
    assert_eq!(h.event(SessionEvent::Exit).unwrap(), Phase::Menu);

    let phase = h
        .classifier(ClassifierEvent::Ready {
            labels: labels(PAIR),
        })
        .unwrap();
    assert_eq!(phase, Phase::Menu);
    assert!(h.session.client().is_ready());

    assert_eq!(h.event(SessionEvent::StartRequested).unwrap(), Phase::Countdown);
    assert!(h.requests.try_recv().is_err());
}

#[test]
fn lost_worker_during_play_returns_to_menu() {
    let mut h = Harness::new(GameConfig::default());
    h.play(PAIR);
    h.draw().unwrap();
    assert!(h.session.is_predicting());

    let err = h.lose_worker().unwrap_err();
    assert_eq!(err, SessionError::Client(ClientError::ChannelClosed));
    assert_eq!(h.session.phase(), Phase::Menu);
    assert!(!h.session.is_predicting());
    assert!(!h.session.client().is_ready());
    assert_eq!(h.session.last_error(), Some(&err));
    assert!(h.session.log().is_empty());
    assert_eq!(h.canvas.clears(), vec![true]);

    assert_eq!(h.event(SessionEvent::StartRequested).unwrap_err(), err);
    assert_eq!(h.session.phase(), Phase::Menu);
    assert_eq!(h.session.last_error(), Some(&err));
}

#[test]
fn lost_worker_during_countdown_returns_to_menu() {
    let mut h = Harness::new(GameConfig::default());
    h.event(SessionEvent::StartRequested).unwrap();
    h.classifier(ClassifierEvent::Ready {
        labels: labels(PAIR),
    })
    .unwrap();
    assert_eq!(h.session.phase(), Phase::Countdown);

    let err = h.lose_worker().unwrap_err();
    assert_eq!(err, SessionError::Client(ClientError::ChannelClosed));
    assert_eq!(h.session.phase(), Phase::Menu);
    assert!(h.canvas.clears().is_empty());
}

#[test]
fn lost_worker_on_end_screen_blocks_play_again() {
    let mut h = Harness::new(GameConfig::default());
    h.play(PAIR);
    h.tick(Duration::from_secs(61));
    assert_eq!(h.session.phase(), Phase::End);

    let err = h.lose_worker().unwrap_err();
    assert_eq!(err, SessionError::Client(ClientError::ChannelClosed));
    assert_eq!(h.session.phase(), Phase::End);
    assert_eq!(h.session.last_error(), Some(&err));

    assert_eq!(h.event(SessionEvent::PlayAgain).unwrap_err(), err);
    assert_eq!(h.session.phase(), Phase::Menu);
}

#[test]
fn commands_rejected_in_wrong_phase() {
    let mut h = Harness::new(GameConfig::default());

    let err = h.event(SessionEvent::Skip).unwrap_err();
    assert_eq!(
        err,
        SessionError::IllegalCommand {
            from: Phase::Menu,
            command: "skip"
        }
    );
    assert!(err.is_recoverable());
    assert!(h.event(SessionEvent::PlayAgain).is_err());
    assert!(h.event(SessionEvent::ClearRequested).is_err());
    assert_eq!(h.session.phase(), Phase::Menu);

    h.play(PAIR);
    assert!(h.event(SessionEvent::StartRequested).is_err());
    assert!(h.event(SessionEvent::Quit).is_err());
    assert_eq!(h.session.phase(), Phase::Playing);
}

#[test]
fn timer_ticks_outside_their_phase_are_ignored() {
    let mut h = Harness::new(GameConfig::default());
    let now = h.now;

    assert_eq!(h.event(SessionEvent::RefreshTick { now }).unwrap(), Phase::Menu);
    assert_eq!(h.event(SessionEvent::CountdownTick { now }).unwrap(), Phase::Menu);

    h.play(PAIR);
    assert_eq!(h.event(SessionEvent::CountdownTick { now }).unwrap(), Phase::Playing);
}

#[test]
fn clear_keeps_round_going() {
    let mut h = Harness::new(GameConfig::default());
    h.play(PAIR);

    h.event(SessionEvent::ClearRequested).unwrap();
    assert_eq!(h.canvas.clears(), vec![false]);
    assert_eq!(h.session.phase(), Phase::Playing);
}
