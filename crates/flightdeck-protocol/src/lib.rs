//! Wire protocol for Flightdeck.
//!
//! This crate defines the "language" clients and the session server speak:
//!
//! - **Types** ([`PlayerId`], [`MovementSnapshot`], [`Color`],
//!   [`DisconnectReason`]): values carried inside messages.
//! - **Messages** ([`MessageTag`], [`ClientMessage`], [`ServerMessage`]):
//!   tagged frames, one closed enum per direction.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how message bodies become
//!   bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (tagged messages) → Session (player state)
//! ```
//!
//! The protocol layer knows nothing about connections or players. It only
//! knows how to frame, encode, and decode.

mod codec;
mod error;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{
    ChatMessage, ClientHandshake, ClientMessage, CreatePlayer, HandshakeResponse,
    MessageTag, ServerMessage, peek_tag,
};
pub use types::{Color, DisconnectReason, MovementSnapshot, PlayerId};

/// Protocol version spoken by this build. Clients must send exactly this
/// in their handshake.
pub const PROTOCOL_VERSION: i32 = 1;
