//! Session state for Flightdeck.
//!
//! Everything the server remembers about a connection lives here:
//!
//! 1. **Pending connections**: peers that connected but have not sent a
//!    valid handshake yet ([`PendingConnections`]), with a join timestamp
//!    for the handshake timeout.
//! 2. **Active players**: peers that completed the handshake
//!    ([`PlayerRegistry`], [`Player`]), each with a server-assigned id.
//! 3. **Names**: what a player may call themselves ([`NamePolicy`]).
//! 4. **Bans**: self-describing ban records ([`BanRecord`]). Nothing here
//!    enforces them.
//!
//! # How it fits in the stack
//!
//! ```text
//! Session server (above)  ← moves peers from pending to active and back out
//!     ↕
//! Session layer (this crate)  ← owns per-peer state, no I/O
//!     ↕
//! Protocol / transport (below)  ← PlayerId, MovementSnapshot, PeerId
//! ```
//!
//! A peer is in at most one of the two sets at a time. Keeping it that way
//! is the server's job; this crate only refuses to promote a peer twice.

mod ban;
mod error;
mod name;
mod pending;
mod player;
mod registry;

pub use ban::{BanRecord, BanTarget, BanType};
pub use error::{BanError, SessionError};
pub use name::{DEFAULT_MAX_NAME_LEN, DEFAULT_NAME_CHARS, NamePolicy, NameViolation};
pub use pending::{HANDSHAKE_TIMEOUT, PendingConnection, PendingConnections};
pub use player::Player;
pub use registry::PlayerRegistry;
