//! Error types for the protocol layer.
//!
//! When you see a `ProtocolError`, the problem is in framing or
//! (de)serialization, never in networking or session state.

use crate::MessageTag;

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of a message body failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization of a message body failed: malformed bytes, missing
    /// fields, or wrong types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame had no tag byte at all.
    #[error("empty frame")]
    EmptyFrame,

    /// The tag byte does not name any message type.
    #[error("unknown message tag {0:#04x}")]
    UnknownTag(u8),

    /// The tag is valid but never flows in this direction (e.g. a client
    /// sending `CreatePlayer`).
    #[error("unexpected {0:?} in this direction")]
    UnexpectedTag(MessageTag),

    /// The byte is not a known disconnect reason.
    #[error("unknown disconnect reason {0}")]
    UnknownReason(u8),
}
