//! Doodle Game - timed drawing-guessing game engine
//!
//! The player is shown a prompt and has a fixed amount of time to get the
//! classifier to recognise as many drawings as possible:
//! - [`GameSession`]: the phase state machine (menu, loading, countdown,
//!   playing, end) fed through a single `transition` entry point
//! - [`AssistScorer`]: time-based suppression of wrong guesses
//! - [`PredictionLog`]: append-only record of resolved rounds
//! - [`SessionDriver`]: tokio loop binding timers, commands and the
//!   classifier worker to a session
//! - [`sim`]: a seeded simulator that plays whole games headless
//!
//! # Example
//!
//! ```rust,ignore
//! use doodle_game::{GameConfig, GameSession, SessionDriver, Command};
//! use doodle_classifier::spawn_worker;
//!
//! let (client, events) = spawn_worker(my_model, 16);
//! let session = GameSession::new(GameConfig::default(), client, my_canvas);
//! let (driver, handle) = SessionDriver::new(session, events);
//! tokio::spawn(driver.run());
//!
//! handle.send(Command::Start).await;
//! println!("{:?}", handle.hud().phase);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod assist;
pub mod canvas;
pub mod config;
pub mod driver;
pub mod error;
pub mod hud;
pub mod prediction_log;
pub mod session;
pub mod sim;
pub mod state_machine;

pub use assist::AssistScorer;
pub use canvas::Canvas;
pub use config::{AssistConfig, GameConfig};
pub use driver::{Command, DriverHandle, SessionDriver};
pub use error::{ConfigError, SessionError};
pub use hud::{format_clock, HudSnapshot};
pub use prediction_log::{GameSummary, PredictionLog, PredictionLogEntry, RoundOutcome, RoundSummary};
pub use session::{GameSession, PlayState, SessionEvent, SessionState};
pub use state_machine::{allowed_transitions, validate_transition, Phase};
