//! One JSON file per tenant.
//!
//! Layout: `<root>/<extension>/<guild>.json`. Writes go to a temp file that
//! is renamed over the target so a crash never leaves a half-written config.

use super::{ConfigStorage, StorageKey};
use crate::error::StorageError;
use async_trait::async_trait;
use hubbot_proto::GuildId;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Filesystem-backed storage.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn extension_dir(&self, extension: &str) -> Result<PathBuf, StorageError> {
        let valid = !extension.is_empty()
            && extension
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(extension.to_string()));
        }
        Ok(self.root.join(extension))
    }

    fn path_for(&self, key: &StorageKey) -> Result<PathBuf, StorageError> {
        Ok(self
            .extension_dir(&key.extension)?
            .join(format!("{}.json", key.guild)))
    }
}

#[async_trait]
impl ConfigStorage for JsonFileStorage {
    async fn load(&self, key: &StorageKey) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &StorageKey, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, &path).await?;

        debug!(path = %path.display(), "Tenant config saved");
        Ok(())
    }

    async fn tenants(&self, extension: &str) -> Result<Vec<GuildId>, StorageError> {
        let dir = self.extension_dir(extension)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut guilds = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match stem.parse::<GuildId>() {
                Ok(guild) => guilds.push(guild),
                Err(_) => warn!(path = %path.display(), "Ignoring unrecognised tenant file"),
            }
        }
        guilds.sort();
        Ok(guilds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_load_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        let key = StorageKey::new("points", GuildId(42));

        assert!(storage.load(&key).await.unwrap().is_none());
        assert!(storage.tenants("points").await.unwrap().is_empty());

        storage.save(&key, br#"{"a":1}"#).await.unwrap();
        storage.save(&key, br#"{"a":2}"#).await.unwrap();

        assert_eq!(storage.load(&key).await.unwrap().unwrap(), br#"{"a":2}"#);
        assert_eq!(storage.tenants("points").await.unwrap(), vec![GuildId(42)]);
        assert!(!dir.path().join("points/42.json.tmp").exists());
    }

    #[tokio::test]
    async fn stray_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        std::fs::create_dir_all(dir.path().join("roles")).unwrap();
        std::fs::write(dir.path().join("roles/notes.txt"), "x").unwrap();
        std::fs::write(dir.path().join("roles/backup.json"), "{}").unwrap();
        std::fs::write(dir.path().join("roles/7.json"), "{}").unwrap();

        assert_eq!(storage.tenants("roles").await.unwrap(), vec![GuildId(7)]);
    }

    #[tokio::test]
    async fn extension_names_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        let key = StorageKey::new("../etc", GuildId(1));
        assert!(matches!(
            storage.save(&key, b"{}").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
