//! Game configuration
//!
//! All timings are stored in milliseconds so the TOML form stays flat and
//! readable. Defaults reproduce the tuned values of the shipped game.

use crate::error::ConfigError;
use doodle_vocab::{BannedLabels, Label, DEFAULT_BANNED_LABELS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Interval between classification refresh ticks
    pub prediction_refresh_ms: u64,
    /// Length of a playthrough; the extra half second keeps the clock from
    /// flickering at the first whole second
    pub game_duration_ms: u64,
    /// Countdown ticks before play starts
    pub countdown_ticks: u32,
    /// Interval between countdown ticks
    pub countdown_tick_ms: u64,
    /// Time added to the round clock when a prompt is skipped
    pub skip_penalty_ms: u64,
    /// Labels never used as prompts or guesses
    pub banned_labels: Vec<Label>,
    /// Easy-mode tuning
    pub assist: AssistConfig,
}

impl GameConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text, then validate
    ///
    /// # Errors
    /// `ConfigError::Parse` or `ConfigError::Invalid`.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, then validate
    ///
    /// # Errors
    /// `ConfigError::Io`, `ConfigError::Parse` or `ConfigError::Invalid`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!("Loaded game config from {}", path.display());
        Ok(config)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// `ConfigError::Invalid` if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("prediction_refresh_ms", self.prediction_refresh_ms),
            ("game_duration_ms", self.game_duration_ms),
            ("countdown_tick_ms", self.countdown_tick_ms),
            ("assist.reject_time_per_label_ms", self.assist.reject_time_per_label_ms),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be greater than 0")));
        }

        let threshold = self.assist.start_reject_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "assist.start_reject_threshold must be within [0, 1], got {threshold}"
            )));
        }
        Ok(())
    }

    /// With game duration
    #[inline]
    #[must_use]
    pub fn with_game_duration(mut self, duration: Duration) -> Self {
        self.game_duration_ms = duration_ms(duration);
        self
    }

    /// With countdown length in ticks
    #[inline]
    #[must_use]
    pub fn with_countdown_ticks(mut self, ticks: u32) -> Self {
        self.countdown_ticks = ticks;
        self
    }

    /// With skip penalty
    #[inline]
    #[must_use]
    pub fn with_skip_penalty(mut self, penalty: Duration) -> Self {
        self.skip_penalty_ms = duration_ms(penalty);
        self
    }

    /// With assist tuning
    #[inline]
    #[must_use]
    pub fn with_assist(mut self, assist: AssistConfig) -> Self {
        self.assist = assist;
        self
    }

    /// With banned labels
    #[must_use]
    pub fn with_banned_labels<I, L>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        self.banned_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    #[inline]
    #[must_use]
    pub fn prediction_refresh(&self) -> Duration {
        Duration::from_millis(self.prediction_refresh_ms)
    }

    #[inline]
    #[must_use]
    pub fn game_duration(&self) -> Duration {
        Duration::from_millis(self.game_duration_ms)
    }

    #[inline]
    #[must_use]
    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    #[inline]
    #[must_use]
    pub fn skip_penalty(&self) -> Duration {
        Duration::from_millis(self.skip_penalty_ms)
    }

    /// Banned labels as a lookup set
    #[must_use]
    pub fn banned(&self) -> BannedLabels {
        BannedLabels::new(self.banned_labels.iter().cloned())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            prediction_refresh_ms: 10,
            game_duration_ms: 60_500,
            countdown_ticks: 3,
            countdown_tick_ms: 1000,
            skip_penalty_ms: 3000,
            banned_labels: DEFAULT_BANNED_LABELS.iter().copied().map(Label::from).collect(),
            assist: AssistConfig::default(),
        }
    }
}

/// Easy-mode tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    /// Top-1 confidence the model must exceed before wrong guesses are
    /// suppressed
    pub start_reject_threshold: f64,
    /// Drawing time before suppression starts
    pub reject_time_delay_ms: u64,
    /// Drawing time per additional suppressed rank
    pub reject_time_per_label_ms: u64,
}

impl AssistConfig {
    #[inline]
    #[must_use]
    pub fn reject_time_delay(&self) -> Duration {
        Duration::from_millis(self.reject_time_delay_ms)
    }

    #[inline]
    #[must_use]
    pub fn reject_time_per_label(&self) -> Duration {
        Duration::from_millis(self.reject_time_per_label_ms)
    }
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            start_reject_threshold: 0.2,
            reject_time_delay_ms: 3000,
            reject_time_per_label_ms: 3000,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_match_shipped_tuning() {
        let config = GameConfig::default();
        assert_eq!(config.game_duration(), Duration::from_millis(60_500));
        assert_eq!(config.prediction_refresh(), Duration::from_millis(10));
        assert_eq!(config.countdown_ticks, 3);
        assert_eq!(config.skip_penalty(), Duration::from_secs(3));
        assert!(config.banned().contains("hexagon"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = GameConfig::from_toml_str(
            r#"
            game_duration_ms = 30000
            banned_labels = ["cat"]

            [assist]
            reject_time_delay_ms = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.game_duration(), Duration::from_secs(30));
        assert_eq!(config.assist.reject_time_delay(), Duration::from_secs(1));
        assert_eq!(config.assist.reject_time_per_label_ms, 3000);
        assert!(config.banned().contains("cat"));
        assert!(!config.banned().contains("bat"));
    }

    #[test]
    fn zero_refresh_is_invalid() {
        let err = GameConfig::from_toml_str("prediction_refresh_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("prediction_refresh_ms")));
    }

    #[test]
    fn threshold_out_of_range_is_invalid() {
        let config = GameConfig::new().with_assist(AssistConfig {
            start_reject_threshold: 1.5,
            ..AssistConfig::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file_and_render_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "countdown_ticks = 5").unwrap();

        let config = GameConfig::load(file.path()).unwrap();
        assert_eq!(config.countdown_ticks, 5);

        let rendered = config.to_toml_string().unwrap();
        assert_eq!(GameConfig::from_toml_str(&rendered).unwrap(), config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = GameConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
