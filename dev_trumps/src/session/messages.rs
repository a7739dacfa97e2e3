//! Session command and event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{
    game::{
        MatchEnding, MatchView, RoundReport,
        entities::{Card, DeckSelection, RoundOutcome, Score, Side, Stat},
    },
    net::{protocol::Role, transport::PeerId},
};

/// What the local player asks the session to do.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionCommand {
    /// Play against the computer.
    StartSolo,
    /// Open a listener and wait for a peer.
    Host,
    /// Dial a hosting peer.
    Connect(PeerId),
    /// Deck for matches this client deals.
    SelectDeck(DeckSelection),
    /// Lead the current round with a stat.
    SelectStat(Stat),
    /// Ask for a rematch once a match is over.
    Restart,
    /// Abandon the current match or connection and go back to the lobby.
    Leave,
    /// Shut the session down.
    Quit,
}

/// Who the current match is against.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchMode {
    Solo,
    Duel(Role),
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Solo => "vs computer",
            Self::Duel(Role::Host) => "hosting",
            Self::Duel(Role::Guest) => "guest",
        };
        write!(f, "{repr}")
    }
}

/// Everything the session tells its UI.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionEvent {
    /// Listening for peers under `peer_id`.
    Hosting { peer_id: PeerId },
    Connecting(PeerId),
    Connected { peer: String, role: Role },
    /// A deck is being generated.
    Loading { deck: DeckSelection },
    MatchStarted {
        match_id: Option<Uuid>,
        deck: DeckSelection,
        mode: MatchMode,
    },
    StateChanged(MatchView),
    /// Our MOVE is on its way; waiting for the peer's REVEAL.
    AwaitingReveal { stat: Stat },
    /// The opponent's card for the round is face-up.
    Revealed {
        stat: Stat,
        opponent_card: Card,
        initiator: Side,
    },
    Logged(LogEntry),
    MatchOver(MatchEnding),
    Notice { message: String, persistent: bool },
    NoticeCleared,
    /// Back in the lobby with no match or connection.
    Lobby,
    /// The session has shut down.
    Closed,
}

/// One resolved round as recorded in the match log.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundLogEntry {
    pub round: u32,
    pub stat: Stat,
    pub initiator: Side,
    pub self_login: String,
    pub self_score: Score,
    pub opponent_login: String,
    pub opponent_score: Score,
    pub outcome: RoundOutcome,
    pub commentary: Option<String>,
    pub at: DateTime<Utc>,
}

impl RoundLogEntry {
    #[must_use]
    pub fn new(report: &RoundReport, initiator: Side, commentary: Option<String>) -> Self {
        Self {
            round: report.round,
            stat: report.stat,
            initiator,
            self_login: report.self_card.login.clone(),
            self_score: report.self_score(),
            opponent_login: report.opponent_card.login.clone(),
            opponent_score: report.opponent_score(),
            outcome: report.outcome,
            commentary,
            at: Utc::now(),
        }
    }
}

impl fmt::Display for RoundLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let leader = match self.initiator {
            Side::Me => "you",
            Side::Opponent => "opponent",
        };
        write!(
            f,
            "Round {}: {leader} picked {}, {} {} vs {} {} -> {}",
            self.round,
            self.stat,
            self.self_login,
            self.self_score,
            self.opponent_login,
            self.opponent_score,
            self.outcome
        )
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum LogEntry {
    Round(RoundLogEntry),
    System { message: String, at: DateTime<Utc> },
}

impl LogEntry {
    #[must_use]
    pub fn system(message: impl Into<String>) -> Self {
        Self::System {
            message: message.into(),
            at: Utc::now(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Round(entry) => write!(f, "{entry}"),
            Self::System { message, .. } => write!(f, "{message}"),
        }
    }
}
