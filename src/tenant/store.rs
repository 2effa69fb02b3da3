//! Lazily populated tenant configuration cache.
//!
//! A tenant is read from storage the first time it is touched, so a store
//! never hands out defaults for a guild that has a readable stored config,
//! whether or not `load_all` has run. A guild whose stored config cannot be
//! read falls back to defaults but is left out of `save_all`; only an
//! explicit [`TenantStore::save`] writes over it.

use super::{TenantConfig, TenantHandle, TenantState};
use crate::error::StorageError;
use crate::storage::{ConfigStorage, StorageKey};
use dashmap::{DashMap, DashSet};
use hubbot_proto::GuildId;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a batch load or save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Tenant configurations of one extension.
pub struct TenantStore<S> {
    extension: String,
    default_indicator: char,
    tenants: DashMap<GuildId, TenantHandle<S>>,
    /// Guilds whose stored config failed to load.
    unreadable: DashSet<GuildId>,
    storage: Arc<dyn ConfigStorage>,
}

impl<S: TenantState> TenantStore<S> {
    pub fn new(
        extension: impl Into<String>,
        default_indicator: char,
        storage: Arc<dyn ConfigStorage>,
    ) -> Self {
        Self {
            extension: extension.into(),
            default_indicator,
            tenants: DashMap::new(),
            unreadable: DashSet::new(),
            storage,
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn default_indicator(&self) -> char {
        self.default_indicator
    }

    /// Number of cached tenants.
    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }

    /// Cached configuration for `guild`, without creating one.
    pub fn get(&self, guild: GuildId) -> Option<TenantHandle<S>> {
        self.tenants.get(&guild).map(|h| Arc::clone(h.value()))
    }

    /// Whether `guild` has a stored config that could not be read.
    pub fn is_unreadable(&self, guild: GuildId) -> bool {
        self.unreadable.contains(&guild)
    }

    /// Configuration for `guild`: the cached one, else the stored one, else
    /// defaults.
    ///
    /// Check-and-insert happens under the map's shard lock, so concurrent
    /// callers for the same guild always receive the same handle and only
    /// one default is ever constructed.
    pub async fn get_or_create(&self, guild: GuildId) -> TenantHandle<S> {
        if let Some(handle) = self.get(guild) {
            return handle;
        }
        let stored = match self.read_stored(guild).await {
            Ok(stored) => stored,
            Err(e) => {
                self.mark_unreadable(guild, &e);
                None
            }
        };
        self.insert_if_absent(guild, stored)
    }

    fn insert_if_absent(&self, guild: GuildId, stored: Option<TenantConfig<S>>) -> TenantHandle<S> {
        let entry = self.tenants.entry(guild).or_insert_with(|| {
            let config = stored.unwrap_or_else(|| {
                debug!(extension = %self.extension, guild = %guild, "Creating default tenant config");
                TenantConfig::new(self.default_indicator)
            });
            Arc::new(RwLock::new(config))
        });
        Arc::clone(entry.value())
    }

    fn mark_unreadable(&self, guild: GuildId, e: &StorageError) {
        warn!(
            extension = %self.extension,
            guild = %guild,
            error = %e,
            "Failed to load tenant config, using defaults"
        );
        crate::metrics::record_persist_failure(&self.extension, "load");
        self.unreadable.insert(guild);
    }

    /// Clone out all handles so no shard lock is held across `.await`.
    fn snapshot(&self) -> Vec<(GuildId, TenantHandle<S>)> {
        self.tenants
            .iter()
            .map(|e| (*e.key(), Arc::clone(e.value())))
            .collect()
    }

    fn encode(handle: &TenantHandle<S>) -> Result<Vec<u8>, StorageError> {
        let config = handle.read();
        Ok(serde_json::to_vec_pretty(&*config)?)
    }

    fn key(&self, guild: GuildId) -> StorageKey {
        StorageKey::new(self.extension.clone(), guild)
    }

    async fn read_stored(&self, guild: GuildId) -> Result<Option<TenantConfig<S>>, StorageError> {
        let Some(bytes) = self.storage.load(&self.key(guild)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Read every persisted tenant of this extension into the cache.
    ///
    /// Tenants already cached are kept as they are. A tenant that fails to
    /// load is logged and left out; it falls back to a default configuration
    /// on first access.
    pub async fn load_all(&self) -> PersistReport {
        let guilds = match self.storage.tenants(&self.extension).await {
            Ok(guilds) => guilds,
            Err(e) => {
                warn!(extension = %self.extension, error = %e, "Failed to list stored tenants");
                crate::metrics::record_persist_failure(&self.extension, "list");
                return PersistReport {
                    succeeded: 0,
                    failed: 1,
                };
            }
        };

        let mut report = PersistReport::default();
        for guild in guilds {
            if self.tenants.contains_key(&guild) {
                continue;
            }
            match self.read_stored(guild).await {
                Ok(Some(config)) => {
                    self.insert_if_absent(guild, Some(config));
                    report.succeeded += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    self.mark_unreadable(guild, &e);
                    report.failed += 1;
                }
            }
        }

        info!(
            extension = %self.extension,
            loaded = report.succeeded,
            failed = report.failed,
            "Tenant configs loaded"
        );
        report
    }

    /// Persist one tenant. Returns `false` when the tenant is not cached.
    pub async fn save(&self, guild: GuildId) -> Result<bool, StorageError> {
        let Some(handle) = self.get(guild) else {
            return Ok(false);
        };
        let bytes = Self::encode(&handle)?;
        self.storage.save(&self.key(guild), &bytes).await?;
        self.unreadable.remove(&guild);
        Ok(true)
    }

    /// Persist every cached tenant. Failures are logged and skipped, as are
    /// tenants whose stored config could not be read.
    pub async fn save_all(&self) -> PersistReport {
        let mut report = PersistReport::default();
        for (guild, handle) in self.snapshot() {
            if self.unreadable.contains(&guild) {
                warn!(
                    extension = %self.extension,
                    guild = %guild,
                    "Keeping unreadable stored tenant config"
                );
                continue;
            }
            let result = match Self::encode(&handle) {
                Ok(bytes) => self.storage.save(&self.key(guild), &bytes).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    warn!(
                        extension = %self.extension,
                        guild = %guild,
                        error = %e,
                        "Failed to save tenant config"
                    );
                    crate::metrics::record_persist_failure(&self.extension, "save");
                    report.failed += 1;
                }
            }
        }

        info!(
            extension = %self.extension,
            saved = report.succeeded,
            failed = report.failed,
            "Tenant configs saved"
        );
        report
    }
}
