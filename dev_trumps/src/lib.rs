//! # Dev Trumps
//!
//! A stat-battle card game where every card is a developer profile with six
//! numeric stats. Two players each hold half of a deck; each round the player
//! with the turn names a stat, both face-up cards are compared on it and the
//! higher score takes both cards plus any pot left by earlier draws. Whoever
//! runs out of cards loses.
//!
//! Matches are played against a computer opponent or against another client
//! over a direct TCP connection. There is no server: each client runs its
//! own copy of the match state and the two stay in step by exchanging moves.
//!
//! ## Core Modules
//!
//! - [`game`]: cards, decks, the match state machine and its collaborators
//! - [`bot`]: the single-player computer opponent
//! - [`net`]: peer transport, wire messages and the peer protocol
//! - [`session`]: the actor that runs a match for one local player
//!
//! ## Example
//!
//! ```
//! use dev_trumps::{MatchState, Side, Stat, entities::Card};
//!
//! let deck: Vec<Card> = ["torvalds", "gaearon", "antirez", "tj"]
//!     .iter()
//!     .zip([90, 80, 20, 10])
//!     .map(|(login, score)| Card::new(login, [score; 6]).unwrap())
//!     .collect();
//!
//! let mut state = MatchState::new();
//! let opponent_hand = state.deal_split(deck, Side::Me).unwrap();
//! let (report, _) = state
//!     .reveal_and_resolve(Stat::Followers, opponent_hand[0].clone())
//!     .unwrap();
//! assert_eq!(report.winner_and_loser().unwrap().0.login, "torvalds");
//! ```

/// Single-player computer opponent.
pub mod bot;

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    EndReason, MatchEnding, MatchError, MatchState, MatchStatus, MatchView,
    commentary::{CommentaryProvider, TemplateCommentary},
    constants,
    entities::{self, Card, DeckSelection, RoundOutcome, Side, Stat},
    roster::{DeckGenerator, FixedDeckGenerator, RosterDeckGenerator},
};

/// Networking components for peer-to-peer matches.
pub mod net;
pub use net::{messages, utils};

/// Match session actor.
pub mod session;
pub use session::{MatchSession, SessionCommand, SessionConfig, SessionEvent, SessionHandle};
