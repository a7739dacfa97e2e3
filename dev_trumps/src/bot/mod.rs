//! Computer opponent for single-player matches.
//!
//! [`LocalOpponent`] owns the opponent's half of the deal as a private mirror
//! deck. The session drives it in lockstep with the player's
//! [`MatchState`](crate::game::MatchState): it leads rounds by picking a stat
//! uniformly at random after a thinking delay and absorbs each round's loot
//! the same way a remote peer would.

mod opponent;

pub use opponent::LocalOpponent;
