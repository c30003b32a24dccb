//! Session configuration
//!
//! A read-only snapshot of the kiosk-wide timing values, taken when a page
//! session starts. Values come from a JSON file or from the flat key/value
//! store the admin side writes (`initial_delay`, `zoom_duration`,
//! `transition_duration`, `volume`).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Timing values for one page session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Pre-focus grace period; carried for the host, not used in timing
    pub initial_delay_seconds: u32,
    /// Focus time for slots whose video has no known length
    pub default_focus_seconds: u32,
    /// Presentation animation length, advisory only
    pub transition_seconds: u32,
    /// Visible countdown before the first focus
    pub countdown_seconds: u32,
    /// Playback volume handed to the presenter, 0-100
    pub volume: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_delay_seconds: 3,
            default_focus_seconds: 60,
            transition_seconds: 1,
            countdown_seconds: 30,
            volume: 50,
        }
    }
}

impl SessionConfig {
    /// Check the ranges the admin side enforces
    pub fn validate(&self) -> Result<()> {
        if self.initial_delay_seconds < 1 {
            return Err(Error::config("initial_delay_seconds must be at least 1"));
        }
        if self.default_focus_seconds < 10 {
            return Err(Error::config("default_focus_seconds must be at least 10"));
        }
        if self.transition_seconds < 1 {
            return Err(Error::config("transition_seconds must be at least 1"));
        }
        if self.volume > 100 {
            return Err(Error::config(format!(
                "volume must be between 0 and 100, got {}",
                self.volume
            )));
        }
        Ok(())
    }

    /// Parse a JSON document; missing keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading session config");
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&contents)
    }

    /// Build a config from key/value rows.
    ///
    /// Unknown keys are ignored with a warning. Values that are not integers
    /// are rejected.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();

        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref().trim();
            match key {
                "initial_delay" => config.initial_delay_seconds = parse_value(key, value)?,
                "zoom_duration" => config.default_focus_seconds = parse_value(key, value)?,
                "transition_duration" => config.transition_seconds = parse_value(key, value)?,
                "countdown" => config.countdown_seconds = parse_value(key, value)?,
                "volume" => config.volume = parse_value(key, value)?,
                other => warn!(key = other, "Ignoring unknown config key"),
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::config(format!("{} must be an integer, got {:?}", key, value)))
}
