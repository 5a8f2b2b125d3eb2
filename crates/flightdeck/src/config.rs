//! Server configuration.
//!
//! Every field has a default, so an empty TOML file (or none at all) gives
//! a working server:
//!
//! ```toml
//! listen_addr = "0.0.0.0:7777"
//! max_connections = 32
//! protocol_version = 1
//! max_name_len = 24
//! max_chat_len = 128
//! tick_interval_ms = 33
//! overrun_policy = "skip"
//! handshake_timeout_ms = 5000
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use flightdeck_protocol::PROTOCOL_VERSION;
use flightdeck_session::{DEFAULT_MAX_NAME_LEN, DEFAULT_NAME_CHARS, HANDSHAKE_TIMEOUT, NamePolicy};
use flightdeck_tick::{OverrunPolicy, TickConfig};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Where the transport listens.
    pub listen_addr: SocketAddr,
    /// Pending plus active connections allowed at once.
    pub max_connections: usize,
    /// The only client version accepted in a handshake.
    pub protocol_version: i32,
    pub max_name_len: usize,
    /// Every character a player name may contain.
    pub name_chars: String,
    /// Longer chat lines are truncated, not rejected.
    pub max_chat_len: usize,
    /// Period of the server tick and of movement broadcasts.
    pub tick_interval_ms: u64,
    /// How the run loop treats ticks it fell behind on.
    pub overrun_policy: OverrunPolicy,
    pub handshake_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 7777)),
            max_connections: 32,
            protocol_version: PROTOCOL_VERSION,
            max_name_len: DEFAULT_MAX_NAME_LEN,
            name_chars: DEFAULT_NAME_CHARS.to_owned(),
            max_chat_len: 128,
            tick_interval_ms: TickConfig::DEFAULT_INTERVAL.as_millis() as u64,
            overrun_policy: OverrunPolicy::default(),
            handshake_timeout_ms: HANDSHAKE_TIMEOUT.as_millis() as u64,
        }
    }
}

impl ServerConfig {
    /// Parses a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Rejects values the server cannot run with.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let zero = |field: &'static str| ConfigError::Invalid {
            field,
            problem: "must be greater than zero",
        };
        if self.max_connections == 0 {
            return Err(zero("max_connections"));
        }
        if self.tick_interval_ms == 0 {
            return Err(zero("tick_interval_ms"));
        }
        if self.handshake_timeout_ms == 0 {
            return Err(zero("handshake_timeout_ms"));
        }
        if self.max_name_len == 0 {
            return Err(zero("max_name_len"));
        }
        if self.max_chat_len == 0 {
            return Err(zero("max_chat_len"));
        }
        if self.name_chars.is_empty() {
            return Err(ConfigError::Invalid {
                field: "name_chars",
                problem: "must not be empty",
            });
        }
        Ok(self)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Scheduler settings for the run loop.
    pub fn tick_config(&self) -> TickConfig {
        TickConfig {
            overrun_policy: self.overrun_policy,
            ..TickConfig::every(self.tick_interval())
        }
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn name_policy(&self) -> NamePolicy {
        NamePolicy::new(self.max_name_len, &self.name_chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.listen_addr.port(), 7777);
        assert_eq!(cfg.max_connections, 32);
        assert_eq!(cfg.protocol_version, PROTOCOL_VERSION);
        assert_eq!(cfg.tick_interval(), TickConfig::DEFAULT_INTERVAL);
        assert_eq!(cfg.tick_interval(), Duration::from_millis(33));
        assert_eq!(cfg.handshake_timeout(), HANDSHAKE_TIMEOUT);
        assert_eq!(cfg.overrun_policy, OverrunPolicy::Skip);
    }

    #[test]
    fn test_from_toml_str_empty_gives_defaults() {
        assert_eq!(ServerConfig::from_toml_str("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_from_toml_str_overrides_given_keys() {
        let cfg = ServerConfig::from_toml_str(
            r#"
            listen_addr = "127.0.0.1:9000"
            max_connections = 4
            name_chars = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.listen_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(cfg.max_connections, 4);
        assert_eq!(cfg.name_chars, "abc");
        assert_eq!(cfg.max_chat_len, 128);
    }

    #[test]
    fn test_from_toml_str_unknown_key_is_rejected() {
        let result = ServerConfig::from_toml_str("max_conections = 4");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validated_zero_connections_is_rejected() {
        let cfg = ServerConfig {
            max_connections: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validated(),
            Err(ConfigError::Invalid {
                field: "max_connections",
                ..
            })
        ));
    }

    #[test]
    fn test_validated_zero_handshake_timeout_is_rejected() {
        let cfg = ServerConfig {
            handshake_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validated(),
            Err(ConfigError::Invalid {
                field: "handshake_timeout_ms",
                ..
            })
        ));
    }

    #[test]
    fn test_overrun_policy_from_toml_reaches_tick_config() {
        let cfg = ServerConfig::from_toml_str(
            r#"
            tick_interval_ms = 50
            overrun_policy = "drop"
            "#,
        )
        .unwrap();

        let tick = cfg.tick_config();
        assert_eq!(tick.overrun_policy, OverrunPolicy::Drop);
        assert_eq!(tick.interval, Duration::from_millis(50));
    }

    #[test]
    fn test_unknown_overrun_policy_is_rejected() {
        let result = ServerConfig::from_toml_str(r#"overrun_policy = "catchup""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validated_empty_charset_is_rejected() {
        let cfg = ServerConfig {
            name_chars: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validated(),
            Err(ConfigError::Invalid {
                field: "name_chars",
                ..
            })
        ));
    }

    #[test]
    fn test_validated_default_is_ok() {
        assert!(ServerConfig::default().validated().is_ok());
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = ServerConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    fn test_name_policy_follows_config() {
        let cfg = ServerConfig {
            max_name_len: 3,
            name_chars: "ab".into(),
            ..Default::default()
        };
        let policy = cfg.name_policy();
        assert!(policy.validate("aba").is_ok());
        assert!(policy.validate("abc").is_err());
        assert!(policy.validate("abab").is_err());
    }
}
