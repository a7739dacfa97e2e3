//! Match sessions.
//!
//! A [`MatchSession`] is the turn orchestrator for one local player. It owns
//! the [`MatchState`](crate::game::MatchState), drives either a
//! [`LocalOpponent`](crate::bot::LocalOpponent) or a peer connection, paces
//! the reveal and result phases with timers and reports everything to the UI
//! as [`SessionEvent`]s. The UI talks back through a [`SessionHandle`].

mod actor;
pub mod config;
pub mod messages;
pub mod timer;

pub use actor::{MatchSession, SessionClosed, SessionHandle};
pub use config::{InvalidConfig, SessionConfig};
pub use messages::{LogEntry, MatchMode, RoundLogEntry, SessionCommand, SessionEvent};
