//! Session configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::game::{
    constants::{
        DEFAULT_COMMENTARY_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, DEFAULT_DUEL_HAND_SIZE,
        DEFAULT_NOTICE_LIFETIME, DEFAULT_POST_RESULT_DELAY, DEFAULT_REVEAL_DWELL,
        DEFAULT_SOLO_HAND_SIZE, DEFAULT_THINK_TIME, MIN_HAND_SIZE,
    },
    entities::DeckSelection,
};

/// Default listener address. Port 0 lets the OS pick a free port.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:0";

#[derive(Debug, Error, Eq, PartialEq)]
pub enum InvalidConfig {
    #[error("{name} must be at least {MIN_HAND_SIZE} card")]
    HandSize { name: &'static str },
    #[error("{name} must be longer than zero")]
    ZeroTimeout { name: &'static str },
    #[error("bind address can't be empty")]
    EmptyBindAddr,
}

/// Timings and sizes of a [`MatchSession`](super::MatchSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Address the host listener binds to
    pub bind_addr: String,

    /// Deck dealt in matches this client starts
    pub deck: DeckSelection,

    /// Cards per side against the computer
    pub solo_hand_size: usize,

    /// Cards per side against a peer
    pub duel_hand_size: usize,

    /// Opponent card on screen before the comparison
    pub reveal_dwell: Duration,

    /// Result on screen before the next round
    pub post_result_delay: Duration,

    /// Computer opponent's delay before leading
    pub think_time: Duration,

    pub connect_timeout: Duration,

    /// How long transient notices stay up
    pub notice_lifetime: Duration,

    /// Longest wait for round commentary
    pub commentary_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            deck: DeckSelection::default(),
            solo_hand_size: DEFAULT_SOLO_HAND_SIZE,
            duel_hand_size: DEFAULT_DUEL_HAND_SIZE,
            reveal_dwell: DEFAULT_REVEAL_DWELL,
            post_result_delay: DEFAULT_POST_RESULT_DELAY,
            think_time: DEFAULT_THINK_TIME,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            notice_lifetime: DEFAULT_NOTICE_LIFETIME,
            commentary_timeout: DEFAULT_COMMENTARY_TIMEOUT,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.bind_addr.trim().is_empty() {
            return Err(InvalidConfig::EmptyBindAddr);
        }
        for (name, size) in [
            ("solo hand size", self.solo_hand_size),
            ("duel hand size", self.duel_hand_size),
        ] {
            if size < MIN_HAND_SIZE {
                return Err(InvalidConfig::HandSize { name });
            }
        }
        for (name, timeout) in [
            ("connect timeout", self.connect_timeout),
            ("notice lifetime", self.notice_lifetime),
            ("commentary timeout", self.commentary_timeout),
        ] {
            if timeout.is_zero() {
                return Err(InvalidConfig::ZeroTimeout { name });
            }
        }
        Ok(())
    }

    /// No pacing delays at all. Handy for tests and simulations.
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.reveal_dwell = Duration::ZERO;
        self.post_result_delay = Duration::ZERO;
        self.think_time = Duration::ZERO;
        self
    }
}
