//! Routing of inbound frames by connection state.
//!
//! ```text
//!            valid handshake
//!  Pending ─────────────────→ Active
//!     │                         │
//!     │ timeout / anything else │ disconnect / violation
//!     ↓                         ↓
//!            Removed (in neither set)
//! ```
//!
//! A handler either accepts the frame or names the [`DisconnectReason`]
//! the peer is kicked with. Faults on our side while handling a frame
//! (an encode failure, a registry refusal) count as `InvalidMessage` for
//! that peer only.

use std::cmp::Ordering;
use std::fmt::Display;

use flightdeck_protocol::{
    ChatMessage, ClientHandshake, ClientMessage, Codec, Color, CreatePlayer, DisconnectReason,
    HandshakeResponse, MessageTag, ServerMessage, peek_tag,
};
use flightdeck_transport::{PeerId, Transport};

use crate::SessionServer;

type Verdict = Result<(), DisconnectReason>;

/// Logs an internal fault and maps it to the reason the peer is kicked with.
pub(crate) fn fault(peer: PeerId, err: impl Display) -> DisconnectReason {
    tracing::warn!(%peer, error = %err, "internal fault while handling message");
    DisconnectReason::InvalidMessage
}

impl<T: Transport, C: Codec> SessionServer<T, C> {
    /// A frame arrived from `peer`.
    pub fn on_message(&mut self, peer: PeerId, data: &[u8]) {
        let verdict = if self.pending.contains(peer) {
            self.dispatch_pending(peer, data)
        } else if self.players.contains_peer(peer) {
            self.dispatch_active(peer, data)
        } else {
            tracing::debug!(%peer, len = data.len(), "message from unknown peer ignored");
            return;
        };
        if let Err(reason) = verdict {
            self.kick(peer, reason);
        }
    }

    fn dispatch_pending(&mut self, peer: PeerId, data: &[u8]) -> Verdict {
        let tag = peek_tag(data).map_err(|e| {
            tracing::warn!(%peer, error = %e, "undecodable frame before handshake");
            DisconnectReason::InvalidMessage
        })?;
        if tag != MessageTag::ClientHandshake {
            tracing::warn!(%peer, ?tag, "message before handshake");
            return Err(DisconnectReason::NotAccepted);
        }
        match ClientMessage::decode(data, &self.codec) {
            Ok(ClientMessage::Handshake(handshake)) => self.accept_handshake(peer, handshake),
            Ok(other) => Err(fault(peer, format!("handshake tag decoded as {:?}", other.tag()))),
            Err(e) => {
                tracing::warn!(%peer, error = %e, "malformed handshake");
                Err(DisconnectReason::InvalidMessage)
            }
        }
    }

    fn dispatch_active(&mut self, peer: PeerId, data: &[u8]) -> Verdict {
        let tag = peek_tag(data).map_err(|e| {
            tracing::warn!(%peer, error = %e, "undecodable frame");
            DisconnectReason::InvalidMessage
        })?;
        if tag == MessageTag::ClientHandshake {
            tracing::warn!(%peer, "second handshake on an active connection");
            return Err(DisconnectReason::DuplicateHandshake);
        }
        let msg = ClientMessage::decode(data, &self.codec).map_err(|e| {
            tracing::warn!(%peer, ?tag, error = %e, "malformed message");
            DisconnectReason::InvalidMessage
        })?;

        match msg {
            ClientMessage::Handshake(_) => Err(DisconnectReason::DuplicateHandshake),
            ClientMessage::MoveData(movement) => {
                if let Some(player) = self.players.get_mut(peer) {
                    player.set_movement(movement);
                }
                Ok(())
            }
            ClientMessage::Chat(chat) => self.handle_chat(peer, chat),
            ClientMessage::StopSpectating => {
                self.stop_spectating(peer);
                Ok(())
            }
        }
    }

    /// Validates a handshake and promotes the peer to an active player.
    fn accept_handshake(&mut self, peer: PeerId, handshake: ClientHandshake) -> Verdict {
        let ClientHandshake {
            version,
            name,
            movement,
        } = handshake;

        let expected = self.config.protocol_version;
        let mismatch = match version.cmp(&expected) {
            Ordering::Less => Some(DisconnectReason::VersionOlder),
            Ordering::Greater => Some(DisconnectReason::VersionNewer),
            Ordering::Equal => None,
        };
        if let Some(reason) = mismatch {
            tracing::warn!(%peer, version, expected, "protocol version mismatch");
            return Err(reason);
        }
        if let Err(violation) = self.names.validate(&name) {
            tracing::warn!(%peer, ?violation, "handshake with invalid name");
            return Err(DisconnectReason::InvalidName);
        }

        // Everyone already in, captured before the newcomer is added.
        let roster = self.players.roster();
        let movements = self.players.movements();
        let others = self.players.peers();

        self.pending.remove(peer);
        let player = self
            .players
            .promote(peer, name, movement)
            .map_err(|e| fault(peer, e))?;
        let id = player.id();
        let name = player.name().to_owned();
        let movement = player.movement().clone();

        let response = ServerMessage::HandshakeResponse(HandshakeResponse {
            id,
            name: name.clone(),
            roster,
            movements,
        });
        self.send_to(peer, &response).map_err(|e| fault(peer, e))?;

        let created = ServerMessage::CreatePlayer(CreatePlayer {
            id,
            name: name.clone(),
            movement,
        });
        self.send_to_many(&others, &created)
            .map_err(|e| fault(peer, e))?;

        let notice = ChatMessage::system(Color::YELLOW, format!("{name} joined the game"));
        let everyone = self.players.peers();
        self.send_to_many(&everyone, &ServerMessage::Chat(notice))
            .map_err(|e| fault(peer, e))?;

        tracing::debug!(
            %peer,
            player_id = %id,
            active = self.players.len(),
            "handshake accepted"
        );
        Ok(())
    }

    pub(crate) fn stop_spectating(&mut self, peer: PeerId) {
        let previous = self
            .players
            .get_mut(peer)
            .and_then(|player| player.stop_spectating());
        if let Some(target) = previous {
            tracing::debug!(%peer, target_id = %target, "stopped spectating");
        }
    }
}
