//! In-process transport backed by plain queues.
//!
//! Nothing leaves the process: the "remote side" is whoever holds the
//! `MemoryTransport` and calls [`connect`](MemoryTransport::connect),
//! [`deliver`](MemoryTransport::deliver) and
//! [`take_sent`](MemoryTransport::take_sent). That makes it the transport of
//! choice for driving a server deterministically in tests and for embedding
//! the session layer behind some other I/O loop.

use std::collections::{HashSet, VecDeque};

use crate::{
    DeliveryMethod, DisconnectCause, PeerId, Transport, TransportError,
    TransportEvent,
};

/// A frame the server handed to [`Transport::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub peer: PeerId,
    pub data: Vec<u8>,
    pub delivery: DeliveryMethod,
}

/// A [`Transport`] whose network is a pair of in-memory queues.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    events: VecDeque<TransportEvent>,
    connected: HashSet<PeerId>,
    sent: Vec<SentFrame>,
    kicked: Vec<(PeerId, Vec<u8>)>,
    next_peer: u64,
    shut_down: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a new remote peer connecting. The `Connected` event is
    /// queued and surfaces on the next poll.
    pub fn connect(&mut self) -> PeerId {
        self.next_peer += 1;
        let peer = PeerId::new(self.next_peer);
        self.connected.insert(peer);
        self.events.push_back(TransportEvent::Connected { peer });
        peer
    }

    /// Queues a frame as if `peer` had sent it.
    pub fn deliver(&mut self, peer: PeerId, data: Vec<u8>) {
        self.events
            .push_back(TransportEvent::Received { peer, data });
    }

    /// Simulates the remote side of `peer` hanging up.
    pub fn hang_up(&mut self, peer: PeerId) {
        if self.connected.remove(&peer) {
            self.events.push_back(TransportEvent::Disconnected {
                peer,
                cause: DisconnectCause::Closed,
            });
        }
    }

    /// Drains every frame sent since the last call.
    pub fn take_sent(&mut self) -> Vec<SentFrame> {
        std::mem::take(&mut self.sent)
    }

    /// Drains every local disconnect (peer and reason payload) since the
    /// last call.
    pub fn take_kicked(&mut self) -> Vec<(PeerId, Vec<u8>)> {
        std::mem::take(&mut self.kicked)
    }

    /// Whether `peer` is still connected from the transport's point of view.
    pub fn is_connected(&self, peer: PeerId) -> bool {
        self.connected.contains(&peer)
    }

    /// Number of queued events not yet polled.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

impl Transport for MemoryTransport {
    fn poll_event(&mut self) -> Option<TransportEvent> {
        self.events.pop_front()
    }

    fn send(
        &mut self,
        peer: PeerId,
        data: &[u8],
        delivery: DeliveryMethod,
    ) -> Result<(), TransportError> {
        if self.shut_down {
            return Err(TransportError::Shutdown);
        }
        if !self.connected.contains(&peer) {
            return Err(TransportError::UnknownPeer(peer));
        }
        self.sent.push(SentFrame {
            peer,
            data: data.to_vec(),
            delivery,
        });
        Ok(())
    }

    fn disconnect(
        &mut self,
        peer: PeerId,
        reason: &[u8],
    ) -> Result<(), TransportError> {
        if !self.connected.remove(&peer) {
            return Err(TransportError::UnknownPeer(peer));
        }
        self.kicked.push((peer, reason.to_vec()));
        // Real transports report locally initiated disconnects too.
        self.events.push_back(TransportEvent::Disconnected {
            peer,
            cause: DisconnectCause::Kicked,
        });
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), TransportError> {
        self.shut_down = true;
        self.connected.clear();
        Ok(())
    }
}
