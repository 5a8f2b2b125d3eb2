//! The session server: connection lifecycle, fan-out, and the run loop.
//!
//! [`SessionServer`] owns everything and is driven from one thread. Each
//! call to [`tick`](SessionServer::tick) drains the transport's event
//! queue, drops handshakes that took too long, and broadcasts movement
//! when the broadcast interval has elapsed. Nothing is shared, so nothing
//! is locked.
//!
//! Message routing lives in `dispatch`, chat in `chat`, movement
//! broadcasting in `broadcast`; all of them are further `impl` blocks on
//! the same type.

use std::future::Future;
use std::time::Instant;

use flightdeck_protocol::{
    ChatMessage, Codec, Color, DisconnectReason, JsonCodec, ProtocolError, ServerMessage,
};
use flightdeck_session::{NamePolicy, PendingConnections, PlayerRegistry};
use flightdeck_tick::TickScheduler;
use flightdeck_transport::{DisconnectCause, PeerId, Transport, TransportEvent};

use crate::broadcast::BroadcastScheduler;
use crate::{FlightdeckError, ServerConfig};

/// Authoritative session server for one game.
pub struct SessionServer<T: Transport, C: Codec = JsonCodec> {
    pub(crate) transport: T,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
    pub(crate) names: NamePolicy,
    pub(crate) pending: PendingConnections,
    pub(crate) players: PlayerRegistry,
    pub(crate) broadcast: BroadcastScheduler,
}

impl<T: Transport> SessionServer<T, JsonCodec> {
    /// Creates a server that speaks JSON bodies.
    ///
    /// # Errors
    /// [`FlightdeckError::Config`] if `config` does not validate.
    pub fn new(transport: T, config: ServerConfig) -> Result<Self, FlightdeckError> {
        Self::with_codec(transport, config, JsonCodec)
    }
}

impl<T: Transport, C: Codec> SessionServer<T, C> {
    pub fn with_codec(transport: T, config: ServerConfig, codec: C) -> Result<Self, FlightdeckError> {
        let config = config.validated()?;
        tracing::info!(
            listen = %config.listen_addr,
            max_connections = config.max_connections,
            protocol_version = config.protocol_version,
            "session server created"
        );
        Ok(Self {
            transport,
            codec,
            names: config.name_policy(),
            broadcast: BroadcastScheduler::new(config.tick_interval()),
            config,
            pending: PendingConnections::new(),
            players: PlayerRegistry::new(),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    pub fn pending(&self) -> &PendingConnections {
        &self.pending
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Runs one server tick at `now`.
    pub fn tick(&mut self, now: Instant) {
        while let Some(event) = self.transport.poll_event() {
            match event {
                TransportEvent::Connected { peer } => self.on_peer_connected(peer, now),
                TransportEvent::Disconnected { peer, cause } => {
                    self.on_peer_disconnected(peer, &cause)
                }
                TransportEvent::Received { peer, data } => self.on_message(peer, &data),
            }
        }

        let timeout = self.config.handshake_timeout();
        for peer in self.pending.sweep_expired(now, timeout) {
            self.kick(peer, DisconnectReason::HandshakeTimeout);
        }

        if self.broadcast.due(now) && !self.players.is_empty() {
            self.broadcast_movement();
            self.broadcast.mark(now);
        }
    }

    // -----------------------------------------------------------------------
    // Connection lifecycle
    // -----------------------------------------------------------------------

    /// A transport-level connection opened. The peer starts out pending.
    pub fn on_peer_connected(&mut self, peer: PeerId, now: Instant) {
        if self.pending.contains(peer) || self.players.contains_peer(peer) {
            tracing::debug!(%peer, "duplicate connect event ignored");
            return;
        }
        if self.pending.len() + self.players.len() >= self.config.max_connections {
            self.kick(peer, DisconnectReason::ServerFull);
            return;
        }
        self.pending.add(peer, now);
    }

    /// A connection closed, whatever the cause. Unknown peers are ignored,
    /// which covers the event that follows our own [`kick`](Self::kick).
    pub fn on_peer_disconnected(&mut self, peer: PeerId, cause: &DisconnectCause) {
        if !self.remove_peer(peer) {
            tracing::debug!(%peer, %cause, "disconnect for unknown peer ignored");
            return;
        }
        tracing::info!(%peer, %cause, "peer disconnected");
    }

    /// Disconnects `peer` with `reason` and forgets it.
    pub(crate) fn kick(&mut self, peer: PeerId, reason: DisconnectReason) {
        tracing::info!(%peer, ?reason, "disconnecting peer");
        if let Err(e) = self.transport.disconnect(peer, &reason.to_payload()) {
            tracing::debug!(%peer, error = %e, "transport disconnect failed");
        }
        self.remove_peer(peer);
    }

    /// Removes `peer` from whichever set holds it. Departing players are
    /// announced to everyone left, and their spectators are released.
    /// Returns `false` if the peer was unknown.
    fn remove_peer(&mut self, peer: PeerId) -> bool {
        if self.pending.remove(peer) {
            return true;
        }
        let Some(player) = self.players.remove(peer) else {
            return false;
        };
        self.players.release_spectators(player.id());

        let remaining = self.players.peers();
        let notice = ChatMessage::system(Color::YELLOW, format!("{} left the game", player.name()));
        let result = self
            .send_to_many(&remaining, &ServerMessage::RemovePlayer(player.id()))
            .and_then(|()| self.send_to_many(&remaining, &ServerMessage::Chat(notice)));
        if let Err(e) = result {
            tracing::warn!(
                player_id = %player.id(),
                error = %e,
                "failed to announce departure"
            );
        }
        true
    }

    // -----------------------------------------------------------------------
    // Sending
    // -----------------------------------------------------------------------

    /// Sends `msg` to one peer with the message's delivery class.
    ///
    /// Transport failures are logged, not returned: the peer is on its way
    /// out and its disconnect event will clean up.
    pub(crate) fn send_to(&mut self, peer: PeerId, msg: &ServerMessage) -> Result<(), ProtocolError> {
        self.send_to_many(&[peer], msg)
    }

    /// Encodes `msg` once and sends it to every peer in `peers`.
    pub(crate) fn send_to_many(
        &mut self,
        peers: &[PeerId],
        msg: &ServerMessage,
    ) -> Result<(), ProtocolError> {
        if peers.is_empty() {
            return Ok(());
        }
        let frame = msg.encode(&self.codec)?;
        let delivery = msg.delivery();
        for &peer in peers {
            if let Err(e) = self.transport.send(peer, &frame, delivery) {
                tracing::debug!(%peer, tag = ?msg.tag(), error = %e, "send failed");
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Run loop
    // -----------------------------------------------------------------------

    /// Ticks at the configured interval until `shutdown` resolves, then
    /// shuts the transport down.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), FlightdeckError>
    where
        F: Future<Output = ()>,
    {
        let mut scheduler = TickScheduler::new(self.config.tick_config());
        tokio::pin!(shutdown);

        tracing::info!(
            interval_ms = self.config.tick_interval_ms,
            overrun_policy = ?self.config.overrun_policy,
            "session server running"
        );
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                tick = scheduler.next_tick() => {
                    self.tick(tick.at.into_std());
                    scheduler.finish_tick();
                }
            }
        }

        let metrics = scheduler.metrics();
        tracing::info!(
            ticks = metrics.ticks,
            overruns = metrics.overruns,
            max_work_ms = metrics.max_work.as_secs_f64() * 1000.0,
            "session server shutting down"
        );
        self.transport.shutdown()?;
        Ok(())
    }
}
