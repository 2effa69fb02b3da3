//! Tenant configuration persistence.
//!
//! Storage is a key-value collaborator addressed by (extension, guild). It
//! only moves bytes; serialization happens in the tenant store.

mod json_file;
mod memory;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;
use async_trait::async_trait;
use hubbot_proto::GuildId;
use std::fmt;

/// Address of one persisted tenant configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey {
    pub extension: String,
    pub guild: GuildId,
}

impl StorageKey {
    pub fn new(extension: impl Into<String>, guild: GuildId) -> Self {
        Self {
            extension: extension.into(),
            guild,
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.extension, self.guild)
    }
}

/// Byte store for tenant configurations.
#[async_trait]
pub trait ConfigStorage: Send + Sync {
    /// Read a stored configuration, `None` if nothing was saved.
    async fn load(&self, key: &StorageKey) -> Result<Option<Vec<u8>>, StorageError>;

    /// Write a configuration, replacing any previous value.
    async fn save(&self, key: &StorageKey, bytes: &[u8]) -> Result<(), StorageError>;

    /// Guilds that have a stored configuration for `extension`.
    async fn tenants(&self, extension: &str) -> Result<Vec<GuildId>, StorageError>;
}
