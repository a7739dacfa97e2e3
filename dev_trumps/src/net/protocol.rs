//! Peer protocol handler.
//!
//! [`PeerProtocol`] turns local intents into outgoing [`PeerMessage`]s and
//! checks incoming ones against the current [`MatchState`]. It never touches
//! a socket; the session feeds it messages and writes its replies.

use log::{debug, warn};
use uuid::Uuid;

use super::{
    errors::ProtocolError,
    messages::{Handshake, MessageKind, PeerMessage},
    protocol_version::ProtocolVersion,
};
use crate::game::{
    MatchError, MatchState, MatchStatus, RoundTrigger,
    entities::{Card, DeckSelection, Side, Stat},
};

/// Which end of the connection this client is.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    /// Accepted the connection and deals the match.
    Host,
    /// Connected to a host and waits for its deal.
    Guest,
}

/// What an incoming message means for the local match.
#[derive(Debug, Eq, PartialEq)]
pub enum Inbound {
    /// The host's HANDSHAKE was dealt into the match state.
    Dealt {
        match_id: Uuid,
        deck: DeckSelection,
    },
    /// A round can be resolved. `reply` must be sent before resolving.
    Round {
        trigger: RoundTrigger,
        reply: Option<PeerMessage>,
    },
    /// The peer ran out of cards.
    OpponentConceded,
    /// The peer confirmed the bankruptcy that ended the last match.
    Acknowledged,
    /// The peer asked for a rematch.
    RestartRequested,
}

#[derive(Debug)]
pub struct PeerProtocol {
    role: Role,
    /// Stat of the MOVE we sent and whose REVEAL hasn't arrived.
    pending_move: Option<Stat>,
    match_id: Option<Uuid>,
    /// The peer still owes a GAME_OVER_ACK for a match it went bankrupt in.
    /// Survives [`PeerProtocol::reset`] since the ack may trail a rematch.
    ack_owed: bool,
}

impl PeerProtocol {
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            pending_move: None,
            match_id: None,
            ack_owed: false,
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn match_id(&self) -> Option<Uuid> {
        self.match_id
    }

    /// Whether a MOVE is waiting for its REVEAL.
    #[must_use]
    pub fn awaiting_reveal(&self) -> bool {
        self.pending_move.is_some()
    }

    /// Expect the peer's GAME_OVER_ACK for a match that just ended with its
    /// deck empty.
    pub fn expect_game_over_ack(&mut self) {
        self.ack_owed = true;
    }

    /// Forget any in-flight round, ready for a new deal.
    pub fn reset(&mut self) {
        self.pending_move = None;
        self.match_id = None;
    }

    /// Deal a freshly generated deck and build the HANDSHAKE for the guest.
    pub fn handshake(
        &mut self,
        state: &mut MatchState,
        full: Vec<Card>,
        deck: DeckSelection,
        turn: Side,
    ) -> Result<PeerMessage, ProtocolError> {
        if self.role != Role::Host {
            return Err(ProtocolError::HostOnly(MessageKind::Handshake));
        }
        let hand = state.deal_split(full, turn)?;
        let match_id = Uuid::new_v4();
        self.pending_move = None;
        self.match_id = Some(match_id);
        debug!("dealing match {match_id}");
        Ok(PeerMessage::Handshake(Handshake {
            version: ProtocolVersion::current(),
            match_id,
            hand,
            host_hand_size: state.self_remaining(),
            turn: turn.other(),
            deck,
        }))
    }

    /// Build a MOVE for `stat`, or `None` if the local player may not move.
    pub fn send_move(&mut self, state: &MatchState, stat: Stat) -> Option<PeerMessage> {
        if !state.awaits_my_move() || self.pending_move.is_some() {
            debug!("ignoring {stat}: not allowed to move right now");
            return None;
        }
        let card = state.self_card()?.clone();
        self.pending_move = Some(stat);
        Some(PeerMessage::Move {
            stat,
            card,
            deck_count: state.self_deck().len(),
        })
    }

    /// Check an incoming message against `state`.
    ///
    /// HANDSHAKE deals into `state` and MOVE/REVEAL adopt the peer's deck
    /// count. Nothing else is mutated; the caller resolves rounds itself.
    pub fn receive(
        &mut self,
        state: &mut MatchState,
        msg: PeerMessage,
    ) -> Result<Inbound, ProtocolError> {
        let kind = msg.kind();
        let unexpected = |status: MatchStatus| ProtocolError::Unexpected { kind, status };
        match msg {
            PeerMessage::Handshake(handshake) => {
                if self.role != Role::Guest {
                    return Err(ProtocolError::HostOnly(kind));
                }
                if !handshake
                    .version
                    .is_compatible_with(&ProtocolVersion::current())
                {
                    return Err(ProtocolError::IncompatibleVersion(handshake.version));
                }
                if state.status() != MatchStatus::AwaitingDeal {
                    return Err(unexpected(state.status()));
                }
                state.deal(handshake.hand, handshake.host_hand_size, handshake.turn)?;
                self.pending_move = None;
                self.match_id = Some(handshake.match_id);
                Ok(Inbound::Dealt {
                    match_id: handshake.match_id,
                    deck: handshake.deck,
                })
            }
            PeerMessage::Move {
                stat,
                card,
                deck_count,
            } => {
                if state.status() != MatchStatus::InProgress {
                    return Err(unexpected(state.status()));
                }
                if state.turn() != Side::Opponent || self.pending_move.is_some() {
                    return Err(ProtocolError::OutOfTurn);
                }
                state.sync_opponent_count(deck_count);
                let own = state.self_card().cloned().ok_or(MatchError::NoSelfCard)?;
                let reply = PeerMessage::Reveal {
                    card: own,
                    deck_count: state.self_deck().len(),
                };
                Ok(Inbound::Round {
                    trigger: RoundTrigger {
                        stat,
                        opponent_card: card,
                        initiator: Side::Opponent,
                    },
                    reply: Some(reply),
                })
            }
            PeerMessage::Reveal { card, deck_count } => {
                if state.status() != MatchStatus::InProgress {
                    return Err(unexpected(state.status()));
                }
                let stat = self
                    .pending_move
                    .take()
                    .ok_or(ProtocolError::UnsolicitedReveal)?;
                state.sync_opponent_count(deck_count);
                Ok(Inbound::Round {
                    trigger: RoundTrigger {
                        stat,
                        opponent_card: card,
                        initiator: Side::Me,
                    },
                    reply: None,
                })
            }
            PeerMessage::GameOverAck => {
                if self.ack_owed {
                    self.ack_owed = false;
                    debug!("peer acknowledged its bankruptcy");
                    return Ok(Inbound::Acknowledged);
                }
                if state.status() == MatchStatus::AwaitingDeal {
                    return Err(unexpected(state.status()));
                }
                self.pending_move = None;
                Ok(Inbound::OpponentConceded)
            }
            PeerMessage::Restart => {
                // Both sides may ask at once, so a host can see the guest's
                // request after it already dealt the rematch.
                if state.is_live() && self.role == Role::Guest {
                    warn!("host asked for a rematch mid-match");
                    return Err(unexpected(state.status()));
                }
                Ok(Inbound::RestartRequested)
            }
        }
    }
}
