//! Async event loop around a [`GameSession`]
//!
//! The driver owns the session and multiplexes three sources into
//! [`GameSession::transition`]: player commands, classifier events and the
//! two phase timers. After every event it publishes a [`HudSnapshot`] on a
//! watch channel. The loop ends when every command sender is dropped.

use crate::canvas::Canvas;
use crate::hud::HudSnapshot;
use crate::session::{GameSession, SessionEvent};
use crate::state_machine::Phase;
use doodle_classifier::ClassifierEvent;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};

/// Command queue depth
pub const COMMAND_CAPACITY: usize = 64;

/// Player input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    /// Canvas reported a stroke
    SketchChanged,
    Clear,
    Skip,
    Exit,
    PlayAgain,
    Quit,
}

impl From<Command> for SessionEvent {
    fn from(command: Command) -> Self {
        match command {
            Command::Start => Self::StartRequested,
            Command::SketchChanged => Self::SketchChanged,
            Command::Clear => Self::ClearRequested,
            Command::Skip => Self::Skip,
            Command::Exit => Self::Exit,
            Command::PlayAgain => Self::PlayAgain,
            Command::Quit => Self::Quit,
        }
    }
}

/// Player-side handle to a running driver
#[derive(Debug, Clone)]
pub struct DriverHandle {
    commands: mpsc::Sender<Command>,
    hud: watch::Receiver<HudSnapshot>,
}

impl DriverHandle {
    /// Queue a command; false if the driver has stopped
    pub async fn send(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Latest HUD state
    #[must_use]
    pub fn hud(&self) -> HudSnapshot {
        self.hud.borrow().clone()
    }

    /// Watch HUD updates
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HudSnapshot> {
        self.hud.clone()
    }
}

/// Session event loop
pub struct SessionDriver<C> {
    session: GameSession<C>,
    commands: mpsc::Receiver<Command>,
    events: mpsc::Receiver<ClassifierEvent>,
    hud: watch::Sender<HudSnapshot>,
}

impl<C> SessionDriver<C>
where
    C: Canvas,
{
    /// Wrap a session and the event receiver of its classifier worker
    #[must_use]
    pub fn new(
        session: GameSession<C>,
        events: mpsc::Receiver<ClassifierEvent>,
    ) -> (Self, DriverHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (hud_tx, hud_rx) = watch::channel(HudSnapshot::capture(&session));

        let driver = Self {
            session,
            commands: command_rx,
            events,
            hud: hud_tx,
        };
        let handle = DriverHandle {
            commands: command_tx,
            hud: hud_rx,
        };
        (driver, handle)
    }

    /// Run until all command senders are gone, then stop the classifier
    /// worker and hand the session back
    pub async fn run(mut self) -> GameSession<C> {
        let mut countdown = interval(self.session.config().countdown_tick());
        countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut refresh = interval(self.session.config().prediction_refresh());
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut events_open = true;

        loop {
            let phase = self.session.phase();

            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command.into()),
                    None => break,
                },

                event = self.events.recv(), if events_open => match event {
                    Some(event) => self.apply(SessionEvent::Classifier(event)),
                    None => {
                        tracing::warn!("Classifier worker closed its event channel");
                        events_open = false;
                        self.apply(SessionEvent::ClassifierDisconnected);
                    }
                },

                now = countdown.tick(), if phase == Phase::Countdown => {
                    self.apply(SessionEvent::CountdownTick { now });
                }

                now = refresh.tick(), if phase == Phase::Playing => {
                    self.apply(SessionEvent::RefreshTick { now });
                }
            }

            // Timers restart from the moment their phase is entered
            let next = self.session.phase();
            if next != phase {
                match next {
                    Phase::Countdown => countdown.reset(),
                    Phase::Playing => refresh.reset(),
                    _ => {}
                }
            }

            self.hud.send_replace(HudSnapshot::capture(&self.session));
        }

        tracing::debug!("Command channel closed, stopping driver");
        self.session.shutdown();
        self.session
    }

    fn apply(&mut self, event: SessionEvent) {
        if let Err(e) = self.session.transition(event) {
            if e.is_recoverable() {
                tracing::warn!("Rejected: {}", e);
            } else {
                tracing::debug!("Session error: {}", e);
            }
        }
    }
}
