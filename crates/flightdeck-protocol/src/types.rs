//! Value types that appear inside message bodies.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Server-assigned identifier of an active player.
///
/// Assigned on a successful handshake and never reused while the server
/// runs. `#[serde(transparent)]` keeps it a bare number on the wire, and
/// lets it double as a map key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// A player's latest movement state.
///
/// Opaque to the server: whatever the client uploads is stored and relayed
/// byte-for-byte. No validation, no simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementSnapshot(pub Vec<u8>);

impl MovementSnapshot {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for MovementSnapshot {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

// ---------------------------------------------------------------------------
// Chat color
// ---------------------------------------------------------------------------

/// RGB color a chat line is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Regular player chat.
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Server notices (joins, departures, confirmations).
    pub const YELLOW: Color = Color::rgb(255, 220, 64);
    /// Private error replies.
    pub const RED: Color = Color::rgb(255, 80, 80);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

// ---------------------------------------------------------------------------
// DisconnectReason
// ---------------------------------------------------------------------------

/// Why the server force-disconnected a peer.
///
/// Sent as a single byte in the transport's disconnect payload so the
/// client can tell the user what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DisconnectReason {
    /// The handshake did not complete in time.
    HandshakeTimeout = 0,
    /// A message other than the handshake arrived before the handshake.
    NotAccepted = 1,
    /// A second handshake arrived on an already active connection.
    DuplicateHandshake = 2,
    /// The client speaks an older protocol version than the server.
    VersionOlder = 3,
    /// The client speaks a newer protocol version than the server.
    VersionNewer = 4,
    /// The requested player name is too long, empty, or uses forbidden
    /// characters.
    InvalidName = 5,
    /// Unknown tag, malformed payload, or an internal fault while handling
    /// the message.
    InvalidMessage = 6,
    /// The server is at its connection limit.
    ServerFull = 7,
}

impl DisconnectReason {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Encodes the reason as a disconnect payload.
    pub fn to_payload(self) -> [u8; 1] {
        [self.as_byte()]
    }

    /// Decodes a disconnect payload produced by [`to_payload`](Self::to_payload).
    pub fn from_payload(payload: &[u8]) -> Result<Self, ProtocolError> {
        match payload.first() {
            Some(&byte) => Self::try_from(byte),
            None => Err(ProtocolError::EmptyFrame),
        }
    }
}

impl TryFrom<u8> for DisconnectReason {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0 => Self::HandshakeTimeout,
            1 => Self::NotAccepted,
            2 => Self::DuplicateHandshake,
            3 => Self::VersionOlder,
            4 => Self::VersionNewer,
            5 => Self::InvalidName,
            6 => Self::InvalidMessage,
            7 => Self::ServerFull,
            other => return Err(ProtocolError::UnknownReason(other)),
        })
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::HandshakeTimeout => "handshake timed out",
            Self::NotAccepted => "connection not accepted",
            Self::DuplicateHandshake => "duplicate handshake",
            Self::VersionOlder => "client version is older than the server",
            Self::VersionNewer => "client version is newer than the server",
            Self::InvalidName => "invalid player name",
            Self::InvalidMessage => "invalid message",
            Self::ServerFull => "server is full",
        };
        f.write_str(text)
    }
}
