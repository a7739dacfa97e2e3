use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::protocol_version::ProtocolVersion;
use crate::game::entities::{Card, DeckSelection, Side, Stat};

/// The host's one-time deal, sent as soon as the connection opens.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Handshake {
    pub version: ProtocolVersion,
    #[serde(with = "uuid::serde::compact")]
    pub match_id: Uuid,
    /// The guest's hand. Its first card is the guest's face-up card.
    pub hand: Vec<Card>,
    pub host_hand_size: usize,
    /// Who leads the first round, from the guest's point of view.
    pub turn: Side,
    pub deck: DeckSelection,
}

/// Messages exchanged between two peers.
///
/// Every round is exactly one MOVE from the side whose turn it is followed by
/// one REVEAL from the other side. `deck_count` is the sender's draw deck size
/// (face-up card excluded) at sending time and is authoritative for the
/// receiver.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PeerMessage {
    Handshake(Handshake),
    Move {
        stat: Stat,
        card: Card,
        deck_count: usize,
    },
    Reveal {
        card: Card,
        deck_count: usize,
    },
    /// The sender's deck ran out.
    GameOverAck,
    /// The sender wants a rematch.
    Restart,
}

impl PeerMessage {
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Handshake(_) => MessageKind::Handshake,
            Self::Move { .. } => MessageKind::Move,
            Self::Reveal { .. } => MessageKind::Reveal,
            Self::GameOverAck => MessageKind::GameOverAck,
            Self::Restart => MessageKind::Restart,
        }
    }
}

impl fmt::Display for PeerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Handshake(handshake) => write!(
                f,
                "HANDSHAKE {} ({} vs {} cards, {} deck)",
                handshake.match_id,
                handshake.hand.len(),
                handshake.host_hand_size,
                handshake.deck
            ),
            Self::Move {
                stat,
                card,
                deck_count,
            } => write!(f, "MOVE {stat} with {card} ({deck_count} left)"),
            Self::Reveal { card, deck_count } => write!(f, "REVEAL {card} ({deck_count} left)"),
            Self::GameOverAck => write!(f, "GAME_OVER_ACK"),
            Self::Restart => write!(f, "RESTART"),
        }
    }
}

/// Payload-free tag of a [`PeerMessage`], used in errors and logs.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum MessageKind {
    Handshake,
    Move,
    Reveal,
    GameOverAck,
    Restart,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Handshake => "HANDSHAKE",
            Self::Move => "MOVE",
            Self::Reveal => "REVEAL",
            Self::GameOverAck => "GAME_OVER_ACK",
            Self::Restart => "RESTART",
        };
        write!(f, "{repr}")
    }
}
