//! Core configuration types and loading.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::{
    default_credentials_path, default_drain_timeout, default_request_timeout,
    default_storage_path, default_true,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("credential file contains an empty token")]
    EmptyToken,
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Gateway connection.
    pub connection: ConnectionConfig,
    /// Tenant configuration storage.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Dispatch hub tuning.
    #[serde(default)]
    pub hub: HubConfig,
    /// Prometheus endpoint.
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-extension settings keyed by extension name.
    #[serde(default)]
    pub extensions: BTreeMap<String, ExtensionConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Settings for one extension (defaults when the table is absent).
    pub fn extension(&self, name: &str) -> ExtensionConfig {
        self.extensions.get(name).cloned().unwrap_or_default()
    }
}

/// Gateway connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// WebSocket URL of the gateway (`ws://` or `wss://`).
    pub url: String,
    /// Path to the credential file.
    #[serde(default = "default_credentials_path")]
    pub credentials: String,
    /// Timeout for a single platform request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ConnectionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Tenant storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory; each extension gets a subdirectory.
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

/// Dispatch hub configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Seconds shutdown waits for in-flight handlers after disconnecting.
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_secs: u64,
}

impl HubConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: default_drain_timeout(),
        }
    }
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// HTTP port for `/metrics`; absent or 0 disables the endpoint.
    pub port: Option<u16>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// Per-extension configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionConfig {
    /// Whether the extension is attached to the hub.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Indicator for tenants that have not chosen one.
    pub indicator: Option<char>,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            indicator: None,
        }
    }
}
