//! Protocol versioning for peer compatibility.

use serde::{Deserialize, Serialize};

/// Version of the peer message set, carried in HANDSHAKE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// V1: HANDSHAKE, MOVE, REVEAL, GAME_OVER_ACK and RESTART with
    /// authoritative deck counts
    V1,
}

impl ProtocolVersion {
    /// Get the current protocol version
    pub fn current() -> Self {
        ProtocolVersion::V1
    }

    /// Check if this version is compatible with another
    pub fn is_compatible_with(&self, other: &ProtocolVersion) -> bool {
        matches!((self, other), (ProtocolVersion::V1, ProtocolVersion::V1))
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::current()
    }
}
