//! Networking layer for peer-to-peer matches.
//!
//! Two clients talk over a single TCP connection using a small binary
//! protocol: length-prefixed bincode frames carrying [`messages::PeerMessage`].
//! The protocol rules live in [`protocol`] and are independent of any socket.

/// Error types for framing, transport and protocol handling.
pub mod errors;

/// Message types exchanged between peers.
pub mod messages;

/// Peer protocol handler: turn-taking and message validation.
pub mod protocol;

/// Protocol versioning for peer compatibility.
pub mod protocol_version;

/// TCP listener, dialing and framed connections.
pub mod transport;

/// Utilities for binary message serialization and framing.
pub mod utils;
