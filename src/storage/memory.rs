//! In-memory storage, used by tests and ephemeral deployments.

use super::{ConfigStorage, StorageKey};
use crate::error::StorageError;
use async_trait::async_trait;
use dashmap::DashMap;
use hubbot_proto::GuildId;

/// Storage backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<StorageKey, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored configurations across all extensions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw bytes for a key.
    pub fn get(&self, key: &StorageKey) -> Option<Vec<u8>> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Store raw bytes directly, bypassing the tenant store.
    pub fn insert(&self, key: StorageKey, bytes: Vec<u8>) {
        self.entries.insert(key, bytes);
    }
}

#[async_trait]
impl ConfigStorage for MemoryStorage {
    async fn load(&self, key: &StorageKey) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.get(key))
    }

    async fn save(&self, key: &StorageKey, bytes: &[u8]) -> Result<(), StorageError> {
        self.entries.insert(key.clone(), bytes.to_vec());
        Ok(())
    }

    async fn tenants(&self, extension: &str) -> Result<Vec<GuildId>, StorageError> {
        let mut guilds: Vec<GuildId> = self
            .entries
            .iter()
            .filter(|e| e.key().extension == extension)
            .map(|e| e.key().guild)
            .collect();
        guilds.sort();
        Ok(guilds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tenants_are_scoped_by_extension() {
        let storage = MemoryStorage::new();
        storage
            .save(&StorageKey::new("points", GuildId(2)), b"{}")
            .await
            .unwrap();
        storage
            .save(&StorageKey::new("points", GuildId(1)), b"{}")
            .await
            .unwrap();
        storage
            .save(&StorageKey::new("roles", GuildId(3)), b"{}")
            .await
            .unwrap();

        assert_eq!(
            storage.tenants("points").await.unwrap(),
            vec![GuildId(1), GuildId(2)]
        );
        assert_eq!(storage.tenants("purge").await.unwrap(), Vec::<GuildId>::new());
        assert!(
            storage
                .load(&StorageKey::new("roles", GuildId(1)))
                .await
                .unwrap()
                .is_none()
        );
    }
}
