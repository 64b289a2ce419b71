//! Configuration loading and management.
//!
//! Everything has a sensible default, so a `Config::default()` client talks
//! to a local development server without any file on disk. A TOML file can
//! override any knob, and `ROOMWIRE_HOST` overrides the server host from
//! the environment.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Room server endpoint.
    #[serde(default)]
    pub server: ServerConfig,
    /// Session timing and limits.
    #[serde(default)]
    pub session: SessionConfig,
    /// Outbound message filter configuration.
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Room server endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host and port of the room server (e.g. "rooms.example.com:443").
    #[serde(default = "default_host")]
    pub host: String,
    /// Connect with wss:// instead of ws://.
    #[serde(default)]
    pub tls: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), tls: false }
    }
}

impl ServerConfig {
    /// Host with the `ROOMWIRE_HOST` environment override applied.
    pub fn effective_host(&self) -> String {
        std::env::var("ROOMWIRE_HOST").unwrap_or_else(|_| self.host.clone())
    }
}

/// Session timing and limits.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Seconds between heartbeat pings while connected.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    /// Delay in milliseconds before the single automatic reconnect attempt.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Maximum outbound message length in characters.
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: default_heartbeat_secs(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_message_len: default_max_message_len(),
        }
    }
}

impl SessionConfig {
    /// Heartbeat interval as a [`Duration`].
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    /// Reconnect delay as a [`Duration`].
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Outbound message filter configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    /// Terms appended to the built-in blocked-term lexicon.
    #[serde(default)]
    pub extra_terms: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_heartbeat_secs() -> u64 {
    30
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

fn default_max_message_len() -> usize {
    256
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no session could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty"));
        }
        if self.session.heartbeat_secs == 0 {
            return Err(ConfigError::Invalid("session.heartbeat_secs must be positive"));
        }
        if self.session.reconnect_delay_ms == 0 {
            return Err(ConfigError::Invalid("session.reconnect_delay_ms must be positive"));
        }
        if self.session.max_message_len == 0 {
            return Err(ConfigError::Invalid("session.max_message_len must be positive"));
        }
        Ok(())
    }
}
