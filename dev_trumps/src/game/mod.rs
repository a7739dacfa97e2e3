//! Card battle engine: cards, decks and the per-client match state machine.
//!
//! - [`entities`]: stats, cards, decks and round outcomes
//! - [`state_machine`]: [`MatchState`] and its transitions
//! - [`roster`]: deck generation collaborator
//! - [`commentary`]: round commentary collaborator

pub mod commentary;
pub mod constants;
pub mod entities;
pub mod roster;
pub mod state_machine;

pub use state_machine::{
    EndReason, MatchEnding, MatchError, MatchState, MatchStatus, MatchView, RoundReport,
    RoundSettlement, RoundTrigger,
};
