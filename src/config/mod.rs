//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ConnectionConfig, ExtensionConfig)
//! - [`credentials`]: The connection credential file
//! - [`validation`]: Startup validation reporting every problem at once
//! - [`defaults`]: Serde default value functions

mod credentials;
mod defaults;
mod types;
mod validation;

pub use credentials::Credentials;
pub use types::{
    Config, ConfigError, ConnectionConfig, ExtensionConfig, HubConfig, LogFormat, LoggingConfig,
    MetricsConfig, StorageConfig,
};
pub use validation::{ValidationError, is_valid_indicator, validate};
