//! Client configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use dev_trumps::{
    DeckSelection, SessionConfig,
    constants::{DEFAULT_DUEL_HAND_SIZE, DEFAULT_SOLO_HAND_SIZE},
    session::config::DEFAULT_BIND_ADDR,
};
use std::time::Duration;

/// Complete client configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Listener bind address used when hosting
    pub bind: String,
    /// Deck for matches this client deals
    pub deck: DeckSelection,
    /// Cards per side against the computer
    pub solo_hand_size: usize,
    /// Cards per side against a peer
    pub duel_hand_size: usize,
    /// Pacing of a round
    pub timing: TimingConfig,
}

/// Round pacing, in the units the environment variables use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingConfig {
    pub reveal_dwell_ms: u64,
    pub post_result_ms: u64,
    pub think_ms: u64,
    pub connect_timeout_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let defaults = SessionConfig::default();
        Self {
            reveal_dwell_ms: millis(defaults.reveal_dwell),
            post_result_ms: millis(defaults.post_result_delay),
            think_ms: millis(defaults.think_time),
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Overrides taken from the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<String>,
    pub deck: Option<DeckSelection>,
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// CLI `overrides` win over the environment, which wins over the
    /// built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns error if `DT_DECK` names a deck that doesn't exist
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        let bind = overrides
            .bind
            .or_else(|| std::env::var("DT_BIND").ok())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let deck = match overrides.deck {
            Some(deck) => deck,
            None => match std::env::var("DT_DECK") {
                Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
                    var: "DT_DECK".to_string(),
                    reason: format!("Unknown deck '{value}'"),
                })?,
                Err(_) => DeckSelection::default(),
            },
        };

        let defaults = TimingConfig::default();
        let timing = TimingConfig {
            reveal_dwell_ms: parse_env_or("DT_REVEAL_DWELL_MS", defaults.reveal_dwell_ms),
            post_result_ms: parse_env_or("DT_POST_RESULT_MS", defaults.post_result_ms),
            think_ms: parse_env_or("DT_THINK_MS", defaults.think_ms),
            connect_timeout_secs: parse_env_or(
                "DT_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
        };

        Ok(ClientConfig {
            bind,
            deck,
            solo_hand_size: parse_env_or("DT_SOLO_HAND_SIZE", DEFAULT_SOLO_HAND_SIZE),
            duel_hand_size: parse_env_or("DT_DUEL_HAND_SIZE", DEFAULT_DUEL_HAND_SIZE),
            timing,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "DT_BIND".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.solo_hand_size == 0 {
            return Err(ConfigError::Invalid {
                var: "DT_SOLO_HAND_SIZE".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.duel_hand_size == 0 {
            return Err(ConfigError::Invalid {
                var: "DT_DUEL_HAND_SIZE".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.timing.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "DT_CONNECT_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Settings for the match session.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            bind_addr: self.bind.clone(),
            deck: self.deck,
            solo_hand_size: self.solo_hand_size,
            duel_hand_size: self.duel_hand_size,
            reveal_dwell: Duration::from_millis(self.timing.reveal_dwell_ms),
            post_result_delay: Duration::from_millis(self.timing.post_result_ms),
            think_time: Duration::from_millis(self.timing.think_ms),
            connect_timeout: Duration::from_secs(self.timing.connect_timeout_secs),
            ..SessionConfig::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND_ADDR.to_string(),
            deck: DeckSelection::default(),
            solo_hand_size: DEFAULT_SOLO_HAND_SIZE,
            duel_hand_size: DEFAULT_DUEL_HAND_SIZE,
            timing: TimingConfig::default(),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
