//! Tagged messages and their framing.
//!
//! Every frame on the wire is one tag byte followed by a codec-encoded body:
//!
//! ```text
//! ┌─────┬──────────────────────────────┐
//! │ tag │ body (codec-encoded, maybe ∅) │
//! └─────┴──────────────────────────────┘
//! ```
//!
//! The same [`MessageTag`] table serves both directions, but the set of
//! bodies differs, so there is one closed enum per direction:
//! [`ClientMessage`] (client → server) and [`ServerMessage`]
//! (server → client). `MoveData` is the one tag used both ways with
//! different bodies: a single snapshot upstream, a map downstream.

use std::collections::BTreeMap;

use flightdeck_transport::DeliveryMethod;
use serde::{Deserialize, Serialize};

use crate::{Codec, Color, MovementSnapshot, PlayerId, ProtocolError};

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

/// One-byte message type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageTag {
    ClientHandshake = 0,
    HandshakeResponse = 1,
    CreatePlayer = 2,
    RemovePlayer = 3,
    MoveData = 4,
    ChatMessage = 5,
    ClientStopSpectating = 6,
}

impl TryFrom<u8> for MessageTag {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0 => Self::ClientHandshake,
            1 => Self::HandshakeResponse,
            2 => Self::CreatePlayer,
            3 => Self::RemovePlayer,
            4 => Self::MoveData,
            5 => Self::ChatMessage,
            6 => Self::ClientStopSpectating,
            other => return Err(ProtocolError::UnknownTag(other)),
        })
    }
}

/// Reads the tag of a frame without decoding its body.
///
/// The server uses this to reject messages that are not allowed in the
/// peer's current state before spending time on the payload.
pub fn peek_tag(frame: &[u8]) -> Result<MessageTag, ProtocolError> {
    split_frame(frame).map(|(tag, _)| tag)
}

fn split_frame(frame: &[u8]) -> Result<(MessageTag, &[u8]), ProtocolError> {
    let (&tag, body) = frame.split_first().ok_or(ProtocolError::EmptyFrame)?;
    Ok((MessageTag::try_from(tag)?, body))
}

fn build_frame<T: Serialize>(
    tag: MessageTag,
    body: &T,
    codec: &impl Codec,
) -> Result<Vec<u8>, ProtocolError> {
    let encoded = codec.encode(body)?;
    let mut frame = Vec::with_capacity(encoded.len() + 1);
    frame.push(tag as u8);
    frame.extend_from_slice(&encoded);
    Ok(frame)
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

/// First message a client sends after connecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientHandshake {
    pub version: i32,
    pub name: String,
    /// Where the player starts; relayed to everyone else right away.
    pub movement: MovementSnapshot,
}

/// The server's answer to an accepted handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeResponse {
    /// The id assigned to the new player.
    pub id: PlayerId,
    /// The name as accepted by the server.
    pub name: String,
    /// Names of the players already in the game (not spectating).
    pub roster: BTreeMap<PlayerId, String>,
    /// Latest movement of the same players.
    pub movements: BTreeMap<PlayerId, MovementSnapshot>,
}

/// Announces a newly joined player to everyone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlayer {
    pub id: PlayerId,
    pub name: String,
    pub movement: MovementSnapshot,
}

/// A chat line. Clients leave `sender` empty; the server fills it in for
/// player chat and leaves it empty for its own notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Option<String>,
    #[serde(default)]
    pub color: Color,
    pub text: String,
}

impl ChatMessage {
    /// A line attributed to a player.
    pub fn from_player(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: Some(name.into()),
            color: Color::WHITE,
            text: text.into(),
        }
    }

    /// An unattributed server line in the given color.
    pub fn system(color: Color, text: impl Into<String>) -> Self {
        Self {
            sender: None,
            color,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Everything a client may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Handshake(ClientHandshake),
    /// The sender's own latest movement.
    MoveData(MovementSnapshot),
    Chat(ChatMessage),
    StopSpectating,
}

impl ClientMessage {
    pub fn tag(&self) -> MessageTag {
        match self {
            Self::Handshake(_) => MessageTag::ClientHandshake,
            Self::MoveData(_) => MessageTag::MoveData,
            Self::Chat(_) => MessageTag::ChatMessage,
            Self::StopSpectating => MessageTag::ClientStopSpectating,
        }
    }

    pub fn encode(&self, codec: &impl Codec) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::Handshake(body) => build_frame(self.tag(), body, codec),
            Self::MoveData(body) => build_frame(self.tag(), body, codec),
            Self::Chat(body) => build_frame(self.tag(), body, codec),
            Self::StopSpectating => Ok(vec![self.tag() as u8]),
        }
    }

    /// Decodes a frame received by the server.
    ///
    /// # Errors
    /// - [`ProtocolError::UnknownTag`] / [`ProtocolError::EmptyFrame`] for
    ///   garbage framing
    /// - [`ProtocolError::UnexpectedTag`] for server-only tags
    /// - [`ProtocolError::Decode`] for a malformed body
    pub fn decode(frame: &[u8], codec: &impl Codec) -> Result<Self, ProtocolError> {
        let (tag, body) = split_frame(frame)?;
        Ok(match tag {
            MessageTag::ClientHandshake => Self::Handshake(codec.decode(body)?),
            MessageTag::MoveData => Self::MoveData(codec.decode(body)?),
            MessageTag::ChatMessage => Self::Chat(codec.decode(body)?),
            MessageTag::ClientStopSpectating => Self::StopSpectating,
            MessageTag::HandshakeResponse
            | MessageTag::CreatePlayer
            | MessageTag::RemovePlayer => {
                return Err(ProtocolError::UnexpectedTag(tag));
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Everything the server may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    HandshakeResponse(HandshakeResponse),
    CreatePlayer(CreatePlayer),
    RemovePlayer(PlayerId),
    /// Latest movement of every player in the game.
    MoveData(BTreeMap<PlayerId, MovementSnapshot>),
    Chat(ChatMessage),
}

impl ServerMessage {
    pub fn tag(&self) -> MessageTag {
        match self {
            Self::HandshakeResponse(_) => MessageTag::HandshakeResponse,
            Self::CreatePlayer(_) => MessageTag::CreatePlayer,
            Self::RemovePlayer(_) => MessageTag::RemovePlayer,
            Self::MoveData(_) => MessageTag::MoveData,
            Self::Chat(_) => MessageTag::ChatMessage,
        }
    }

    /// Delivery class the message must travel with. Movement is superseded
    /// every broadcast tick, so only the newest frame matters; everything
    /// else changes roster or chat state and must arrive in order.
    pub fn delivery(&self) -> DeliveryMethod {
        match self {
            Self::MoveData(_) => DeliveryMethod::Sequenced,
            _ => DeliveryMethod::ReliableOrdered,
        }
    }

    pub fn encode(&self, codec: &impl Codec) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::HandshakeResponse(body) => build_frame(self.tag(), body, codec),
            Self::CreatePlayer(body) => build_frame(self.tag(), body, codec),
            Self::RemovePlayer(body) => build_frame(self.tag(), body, codec),
            Self::MoveData(body) => build_frame(self.tag(), body, codec),
            Self::Chat(body) => build_frame(self.tag(), body, codec),
        }
    }

    /// Decodes a frame received by a client.
    pub fn decode(frame: &[u8], codec: &impl Codec) -> Result<Self, ProtocolError> {
        let (tag, body) = split_frame(frame)?;
        Ok(match tag {
            MessageTag::HandshakeResponse => Self::HandshakeResponse(codec.decode(body)?),
            MessageTag::CreatePlayer => Self::CreatePlayer(codec.decode(body)?),
            MessageTag::RemovePlayer => Self::RemovePlayer(codec.decode(body)?),
            MessageTag::MoveData => Self::MoveData(codec.decode(body)?),
            MessageTag::ChatMessage => Self::Chat(codec.decode(body)?),
            MessageTag::ClientHandshake | MessageTag::ClientStopSpectating => {
                return Err(ProtocolError::UnexpectedTag(tag));
            }
        })
    }
}

// =========================================================================
// Tests
// =========================================================================
