//! Unified error type for Flightdeck.

use std::path::PathBuf;

use flightdeck_protocol::ProtocolError;
use flightdeck_session::SessionError;
use flightdeck_transport::TransportError;

/// Top-level error that wraps every layer's error.
///
/// Protocol violations by a peer never surface here: they end in a
/// disconnect with a reason. This type covers startup and shutdown, plus
/// faults callers of the lower-level APIs may want to propagate.
#[derive(Debug, thiserror::Error)]
pub enum FlightdeckError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Why a server configuration could not be loaded or was refused.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range. Names the offending field.
    #[error("invalid config: {field} {problem}")]
    Invalid {
        field: &'static str,
        problem: &'static str,
    },
}
