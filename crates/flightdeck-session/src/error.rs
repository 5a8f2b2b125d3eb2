//! Error types for the session layer.

use flightdeck_protocol::PlayerId;
use flightdeck_transport::PeerId;

use crate::BanType;

/// Errors from the pending tracker and the player registry.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The peer already owns an active player. A peer maps to at most one
    /// player.
    #[error("peer {0} already has an active player")]
    AlreadyActive(PeerId),

    /// A player tried to spectate themselves.
    #[error("player {0} cannot spectate themselves")]
    SelfSpectate(PlayerId),

    /// The id counter ran out. Ids are never reused, so no more players can
    /// join until the server restarts.
    #[error("player ids exhausted")]
    IdsExhausted,
}

/// Errors raised when a ban record fails validation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BanError {
    /// The record's type calls for an identity field that is absent.
    #[error("{0:?} ban is missing its identity value")]
    MissingIdentity(BanType),

    /// The record carries the identity field of the other ban type.
    #[error("{0:?} ban must not carry a {1} value")]
    ConflictingIdentity(BanType, &'static str),
}
