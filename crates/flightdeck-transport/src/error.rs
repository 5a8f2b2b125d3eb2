use crate::PeerId;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer is not (or no longer) connected to this transport.
    #[error("unknown peer {0}")]
    UnknownPeer(PeerId),

    /// The peer's connection went away while we were handing it data.
    #[error("connection to {0} closed")]
    ConnectionClosed(PeerId),

    /// The peer stopped draining its outbound queue and was dropped.
    #[error("outbound queue for {0} is full")]
    Backlogged(PeerId),

    /// Binding the listening socket failed.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,
}
