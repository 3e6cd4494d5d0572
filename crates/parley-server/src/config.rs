//! Server configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! gives a working server on port 1108. Command-line flags are applied on
//! top of whatever the file provided.
//!
//! ```toml
//! bind = "0.0.0.0:1108"
//! sweep_interval_secs = 20
//! max_line_length = 8192
//! outbound_buffer = 1024
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use parley_hub::HubConfig;
use serde::Deserialize;

use crate::connection::ConnectionLimits;
use crate::error::ServerError;

/// Port the server listens on when nothing else is configured.
pub const DEFAULT_PORT: u16 = 1108;

/// Longest accepted request line, in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8192;

/// Lines queued per client before it is treated as dead.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to accept client connections on.
    pub bind: SocketAddr,
    /// Seconds between liveness sweeps.
    pub sweep_interval_secs: u64,
    /// Connections sending a longer line are dropped.
    pub max_line_length: usize,
    /// Lines that may wait for one client; a client that falls further
    /// behind stops counting as alive and is evicted by the next sweep.
    pub outbound_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            sweep_interval_secs: parley_hub::config::DEFAULT_SWEEP_INTERVAL.as_secs(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ServerError> {
        let config: Self =
            toml::from_str(raw).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.max_line_length == 0 {
            return Err(ServerError::Config("max_line_length must be non-zero".into()));
        }
        if self.outbound_buffer == 0 {
            return Err(ServerError::Config("outbound_buffer must be non-zero".into()));
        }
        self.hub_config().validate()?;
        Ok(())
    }

    /// Hub-core settings derived from this config.
    pub fn hub_config(&self) -> HubConfig {
        HubConfig::new().sweep_interval(Duration::from_secs(self.sweep_interval_secs))
    }

    pub fn limits(&self) -> ConnectionLimits {
        ConnectionLimits {
            max_line_length: self.max_line_length,
            outbound_buffer: self.outbound_buffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind.port(), 1108);
        assert_eq!(config.sweep_interval_secs, 20);
        assert_eq!(config.max_line_length, 8192);
        assert_eq!(config.limits().outbound_buffer, DEFAULT_OUTBOUND_BUFFER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(ServerConfig::from_toml_str("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let config = ServerConfig::from_toml_str(
            r#"
            bind = "127.0.0.1:4000"
            sweep_interval_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.bind, "127.0.0.1:4000".parse().unwrap());
        assert_eq!(config.hub_config().sweep_interval, Duration::from_secs(5));
        assert_eq!(config.max_line_length, DEFAULT_MAX_LINE_LENGTH);
    }

    #[test]
    fn unknown_key_rejected() {
        let err = ServerConfig::from_toml_str("port = 1").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn zero_outbound_buffer_rejected() {
        let err = ServerConfig::from_toml_str("outbound_buffer = 0").unwrap_err();
        assert!(err.to_string().contains("outbound_buffer"));
    }

    #[test]
    fn zero_sweep_interval_rejected() {
        let err = ServerConfig::from_toml_str("sweep_interval_secs = 0").unwrap_err();
        assert!(matches!(err, ServerError::Hub(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parley.toml");
        std::fs::write(&path, "max_line_length = 256\n").unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.max_line_length, 256);

        let missing = ServerConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(missing.to_string().contains("failed to read"));
    }
}
