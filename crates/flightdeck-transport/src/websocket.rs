//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! Each accepted socket gets its own Tokio task that owns the stream. The
//! task forwards inbound frames into a shared event channel and drains a
//! per-peer outbound channel. [`WebSocketTransport`] itself only holds the
//! receiving end of the event channel plus the outbound senders, so
//! `poll_event`, `send` and `disconnect` never block.
//!
//! The outbound channel holds at most [`OUTBOUND_CAPACITY`] frames. A peer
//! that stops reading fills it up; the next `send` then fails with
//! [`TransportError::Backlogged`], the connection task is aborted, and a
//! `Disconnected` event is queued for the peer.
//!
//! WebSocket runs over TCP, so every [`DeliveryMethod`] ends up reliable and
//! ordered on the wire. Sequenced traffic is still accepted; it just never
//! gets dropped.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{AbortHandle, JoinHandle};
use tokio_tungstenite::tungstenite::Message;

use crate::{
    DeliveryMethod, DisconnectCause, PeerId, Transport, TransportError,
    TransportEvent,
};

/// Frames that may wait for one peer's socket before it counts as stalled.
/// About eight seconds of movement broadcasts at the default tick rate.
pub const OUTBOUND_CAPACITY: usize = 256;

/// Counter for generating unique peer IDs.
static NEXT_PEER_ID: AtomicU64 = AtomicU64::new(1);

/// Messages from connection tasks back to the transport.
enum Inbound {
    /// Handshake done; here is where to push outbound frames.
    Opened { peer: PeerId, conn: Connection },
    Event(TransportEvent),
}

/// The transport's handle on one connection task.
struct Connection {
    outbound: mpsc::Sender<Outbound>,
    task: AbortHandle,
}

/// Messages from the transport to one connection task.
enum Outbound {
    Frame(Vec<u8>),
    /// Send a last frame carrying the reason, then close.
    Close(Vec<u8>),
}

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    local_addr: SocketAddr,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    peers: HashMap<PeerId, Connection>,
    /// Disconnects decided on this side, reported before anything else.
    local_events: VecDeque<TransportEvent>,
    accept_task: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address and starts
    /// accepting connections in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        let local_addr =
            listener.local_addr().map_err(TransportError::BindFailed)?;
        tracing::info!(%local_addr, "WebSocket transport listening");

        let (tx, rx) = mpsc::unbounded_channel();
        let accept_task = tokio::spawn(accept_loop(listener, tx));

        Ok(Self {
            local_addr,
            inbound: rx,
            peers: HashMap::new(),
            local_events: VecDeque::new(),
            accept_task,
        })
    }

    /// Returns the local address the transport is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of peers currently known to the transport.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Tears down a peer whose outbound queue is full.
    fn drop_backlogged(&mut self, peer: PeerId) {
        if let Some(conn) = self.peers.remove(&peer) {
            conn.task.abort();
        }
        tracing::warn!(
            %peer,
            capacity = OUTBOUND_CAPACITY,
            "outbound queue full, dropping peer"
        );
        self.local_events.push_back(TransportEvent::Disconnected {
            peer,
            cause: DisconnectCause::Error("outbound queue full".into()),
        });
    }
}

impl Transport for WebSocketTransport {
    fn poll_event(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.local_events.pop_front() {
            return Some(event);
        }
        match self.inbound.try_recv().ok()? {
            Inbound::Opened { peer, conn } => {
                self.peers.insert(peer, conn);
                Some(TransportEvent::Connected { peer })
            }
            Inbound::Event(event) => {
                if let TransportEvent::Disconnected { peer, .. } = &event {
                    self.peers.remove(peer);
                }
                Some(event)
            }
        }
    }

    fn send(
        &mut self,
        peer: PeerId,
        data: &[u8],
        _delivery: DeliveryMethod,
    ) -> Result<(), TransportError> {
        let conn = self
            .peers
            .get(&peer)
            .ok_or(TransportError::UnknownPeer(peer))?;
        match conn.outbound.try_send(Outbound::Frame(data.to_vec())) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.drop_backlogged(peer);
                Err(TransportError::Backlogged(peer))
            }
            Err(TrySendError::Closed(_)) => Err(TransportError::ConnectionClosed(peer)),
        }
    }

    fn disconnect(
        &mut self,
        peer: PeerId,
        reason: &[u8],
    ) -> Result<(), TransportError> {
        let conn = self
            .peers
            .remove(&peer)
            .ok_or(TransportError::UnknownPeer(peer))?;
        match conn.outbound.try_send(Outbound::Close(reason.to_vec())) {
            Ok(()) => Ok(()),
            // No room for the reason frame; close without it.
            Err(TrySendError::Full(_)) => {
                conn.task.abort();
                self.local_events.push_back(TransportEvent::Disconnected {
                    peer,
                    cause: DisconnectCause::Kicked,
                });
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(TransportError::ConnectionClosed(peer)),
        }
    }

    fn shutdown(&mut self) -> Result<(), TransportError> {
        self.accept_task.abort();
        // Dropping the senders makes every connection task close its socket.
        self.peers.clear();
        tracing::info!(local_addr = %self.local_addr, "WebSocket transport shut down");
        Ok(())
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn accept_loop(
    listener: TcpListener,
    inbound: mpsc::UnboundedSender<Inbound>,
) {
    while !inbound.is_closed() {
        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                continue;
            }
        };
        let peer = PeerId::new(NEXT_PEER_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%peer, %addr, "accepted TCP connection");
        let (handle_tx, handle_rx) = oneshot::channel();
        let task = tokio::spawn(serve_peer(stream, peer, inbound.clone(), handle_rx));
        let _ = handle_tx.send(task.abort_handle());
    }
}

async fn serve_peer(
    stream: TcpStream,
    peer: PeerId,
    inbound: mpsc::UnboundedSender<Inbound>,
    handle: oneshot::Receiver<AbortHandle>,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::debug!(%peer, error = %e, "WebSocket handshake failed");
            return;
        }
    };

    let Ok(task) = handle.await else {
        return;
    };
    let (out_tx, mut out_rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let conn = Connection {
        outbound: out_tx,
        task,
    };
    if inbound.send(Inbound::Opened { peer, conn }).is_err() {
        return;
    }

    let (mut sink, mut stream) = ws.split();

    let cause = loop {
        tokio::select! {
            outbound = out_rx.recv() => match outbound {
                Some(Outbound::Frame(data)) => {
                    if let Err(e) = sink.send(Message::Binary(data.into())).await {
                        break DisconnectCause::Error(e.to_string());
                    }
                }
                Some(Outbound::Close(reason)) => {
                    let _ = sink.send(Message::Binary(reason.into())).await;
                    let _ = sink.close().await;
                    break DisconnectCause::Kicked;
                }
                None => {
                    let _ = sink.close().await;
                    break DisconnectCause::Kicked;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Binary(data))) => {
                    let event = TransportEvent::Received { peer, data: data.to_vec() };
                    if inbound.send(Inbound::Event(event)).is_err() {
                        break DisconnectCause::Kicked;
                    }
                }
                Some(Ok(Message::Text(text))) => {
                    let event = TransportEvent::Received {
                        peer,
                        data: text.as_bytes().to_vec(),
                    };
                    if inbound.send(Inbound::Event(event)).is_err() {
                        break DisconnectCause::Kicked;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break DisconnectCause::Closed,
                Some(Ok(_)) => {} // ping/pong/raw frame
                Some(Err(e)) => break DisconnectCause::Error(e.to_string()),
            },
        }
    };

    tracing::debug!(%peer, %cause, "connection task finished");
    let _ = inbound.send(Inbound::Event(TransportEvent::Disconnected {
        peer,
        cause,
    }));
}
