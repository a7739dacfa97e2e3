//! Network error types for serialization, transport and protocol operations.

use std::io;
use thiserror::Error;

use super::{messages::MessageKind, protocol_version::ProtocolVersion};
use crate::game::{MatchError, MatchStatus};

/// Errors that can occur during network message serialization/deserialization
#[derive(Debug, Error)]
pub enum SerializationError {
    /// Failed to encode a message
    #[error("Failed to encode message: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Failed to decode a message
    #[error("Failed to decode message: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// Message size exceeded maximum allowed
    #[error("Message size {actual} exceeds maximum {max}")]
    MessageTooLarge { actual: usize, max: usize },
}

/// Result type for serialization operations
pub type Result<T> = std::result::Result<T, SerializationError>;

/// Failures of the connection collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The local listener couldn't be bound, so there is no id to share.
    #[error("couldn't bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("'{0}' isn't a valid peer id (expected host:port)")]
    InvalidPeerId(String),

    #[error("peer {peer} is unavailable: {source}")]
    PeerUnavailable {
        peer: String,
        #[source]
        source: io::Error,
    },

    #[error("connection to {0} timed out")]
    Timeout(String),

    #[error("connection closed")]
    Closed,

    #[error("network error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Whether the failure should stay on screen until the user retries.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Bind { .. })
    }
}

/// A peer sent something that doesn't fit the current match.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ProtocolError {
    #[error("peer speaks incompatible protocol {0:?}")]
    IncompatibleVersion(ProtocolVersion),

    #[error("unexpected {kind} while {status}")]
    Unexpected {
        kind: MessageKind,
        status: MatchStatus,
    },

    #[error("{0} is only sent by the host")]
    HostOnly(MessageKind),

    #[error("MOVE received out of turn")]
    OutOfTurn,

    #[error("REVEAL received without a pending MOVE")]
    UnsolicitedReveal,

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("peer's message broke the match: {0}")]
    Match(#[from] MatchError),
}
