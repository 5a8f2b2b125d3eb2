//! Transport abstraction layer for Flightdeck.
//!
//! The session layer never touches sockets. It only needs three things
//! from the network:
//!
//! - lifecycle events (a peer connected, a peer went away),
//! - framed messages received from a peer,
//! - a way to send bytes to a peer with a given [`DeliveryMethod`].
//!
//! The [`Transport`] trait captures exactly that. It is deliberately
//! *synchronous*: the server pumps [`Transport::poll_event`] once per tick
//! and handles each event to completion before asking for the next one.
//! Implementations are free to run their own tasks behind the scenes (the
//! WebSocket transport does), as long as events come out one at a time.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

mod error;
mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use memory::{MemoryTransport, SentFrame};
#[cfg(feature = "websocket")]
pub use websocket::{OUTBOUND_CAPACITY, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a remote peer.
///
/// Peers are minted by the transport. The session layer stores them as
/// map keys and hands them back when sending, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(u64);

impl PeerId {
    /// Creates a new `PeerId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Delivery guarantee requested for an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeliveryMethod {
    /// May be lost, may arrive out of order.
    Unreliable,

    /// May be lost, but never delivered out of order: a frame older than
    /// one already delivered is dropped. Suited to state where only the
    /// latest value matters (movement snapshots).
    Sequenced,

    /// Delivered exactly once, in order.
    #[default]
    ReliableOrdered,
}

/// Why a peer's connection ended, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectCause {
    /// The remote side closed the connection.
    Closed,
    /// The local side asked for the disconnect via [`Transport::disconnect`].
    Kicked,
    /// The connection failed (I/O error, protocol error, timeout).
    Error(String),
}

impl fmt::Display for DisconnectCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed by remote"),
            Self::Kicked => write!(f, "disconnected by server"),
            Self::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// A single event produced by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A new peer finished connecting at the transport level.
    Connected { peer: PeerId },

    /// A peer is gone. Emitted once per peer, including after a local
    /// [`Transport::disconnect`].
    Disconnected { peer: PeerId, cause: DisconnectCause },

    /// A complete frame arrived from a peer.
    Received { peer: PeerId, data: Vec<u8> },
}

/// A message-oriented network transport.
///
/// All methods are non-blocking. `send` and `disconnect` queue work and
/// return immediately; failures only describe whether the request could be
/// queued, not whether the remote side received it.
pub trait Transport: Send + 'static {
    /// Returns the next pending event, or `None` if nothing is queued.
    fn poll_event(&mut self) -> Option<TransportEvent>;

    /// Queues `data` for delivery to `peer`.
    fn send(
        &mut self,
        peer: PeerId,
        data: &[u8],
        delivery: DeliveryMethod,
    ) -> Result<(), TransportError>;

    /// Disconnects `peer`, delivering `reason` as the final payload.
    fn disconnect(
        &mut self,
        peer: PeerId,
        reason: &[u8],
    ) -> Result<(), TransportError>;

    /// Stops accepting new peers and closes existing ones.
    fn shutdown(&mut self) -> Result<(), TransportError>;
}
