//! # Flightdeck
//!
//! Authoritative session server for small real-time multiplayer games.
//!
//! Flightdeck admits clients through a versioned handshake, keeps the
//! roster of active players, relays each player's opaque movement state to
//! everyone at a fixed rate, and carries chat with a `/spectate` command.
//! It does not simulate anything: movement is stored and forwarded as-is.
//!
//! ## Layers
//!
//! ```text
//! flightdeck (this crate)   SessionServer: handshake, chat, broadcast, run loop
//!     ↕
//! flightdeck-session        pending connections, player registry, bans
//! flightdeck-tick           fixed-interval tick scheduler
//!     ↕
//! flightdeck-protocol       tagged messages, codec, disconnect reasons
//!     ↕
//! flightdeck-transport      Transport trait, WebSocket and in-memory transports
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use flightdeck::prelude::*;
//!
//! # async fn run() -> Result<(), FlightdeckError> {
//! let config = ServerConfig::default();
//! let transport = WebSocketTransport::bind(config.listen_addr).await?;
//! let mut server = SessionServer::new(transport, config)?;
//! server
//!     .run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! # }
//! ```

mod broadcast;
mod chat;
mod config;
mod dispatch;
mod error;
mod server;

pub use broadcast::BroadcastScheduler;
pub use chat::{ChatCommand, sanitize};
pub use config::ServerConfig;
pub use error::{ConfigError, FlightdeckError};
pub use server::SessionServer;

/// Everything needed to embed a server, in one import.
pub mod prelude {
    pub use crate::{ConfigError, FlightdeckError, ServerConfig, SessionServer};

    pub use flightdeck_protocol::{
        ChatMessage, ClientHandshake, ClientMessage, Codec, Color, DisconnectReason, JsonCodec,
        MovementSnapshot, PROTOCOL_VERSION, PlayerId, ServerMessage,
    };
    pub use flightdeck_session::{BanRecord, BanTarget, Player, PlayerRegistry};
    pub use flightdeck_transport::{
        DeliveryMethod, DisconnectCause, MemoryTransport, PeerId, Transport, TransportEvent,
        WebSocketTransport,
    };
}
