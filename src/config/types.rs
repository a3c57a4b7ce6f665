//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::delivery::DeliveryConfig;
use super::history::HistoryConfig;
use super::listen::ListenConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server information.
    #[serde(default)]
    pub server: ServerConfig,
    /// Network listen configuration.
    pub listen: ListenConfig,
    /// Read/write timeouts.
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    /// Chat history log.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Outbound queues and backpressure.
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name, used in log output.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Prometheus metrics HTTP port. 0 disables the endpoint.
    #[serde(default)]
    pub metrics_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            metrics_port: 0,
        }
    }
}

fn default_server_name() -> String {
    "chatrelay".to_string()
}

/// Timeout configuration for client streams.
///
/// - `read`: seconds of client silence before the session is dropped (0 disables)
/// - `write`: seconds allowed for a single write to a client stream
/// - `shutdown_grace`: seconds to wait for sessions to clean up on shutdown
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default)]
    pub read: u64,

    #[serde(default = "default_write_timeout")]
    pub write: u64,

    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace: u64,
}

impl TimeoutsConfig {
    /// Read idle limit, `None` when disabled.
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read > 0).then(|| Duration::from_secs(self.read))
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace)
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            read: 0,
            write: default_write_timeout(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

fn default_write_timeout() -> u64 {
    10
}

fn default_shutdown_grace() -> u64 {
    5
}

pub(super) fn default_true() -> bool {
    true
}
