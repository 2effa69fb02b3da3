//! Per-tenant configuration.
//!
//! Every (extension, guild) pair owns exactly one [`TenantConfig`]. It is
//! created lazily with defaults on first access, cached for the life of the
//! process, loaded from storage at startup and written back at shutdown.

mod store;

pub use store::{PersistReport, TenantStore};

use hubbot_proto::RoleId;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Extension-specific tenant state.
///
/// Anything serializable with a sensible default qualifies.
pub trait TenantState: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

impl<T> TenantState for T where T: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

/// Configuration of one extension for one guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantConfig<S> {
    /// Character that must prefix a command message.
    pub indicator: char,
    /// Roles granting `Admin` level.
    #[serde(default)]
    pub admin_roles: BTreeSet<RoleId>,
    /// Unix timestamp of first creation.
    #[serde(default)]
    pub created_at: i64,
    /// Extension-specific fields.
    #[serde(default)]
    pub state: S,
}

impl<S: Default> TenantConfig<S> {
    /// Fresh configuration with default state.
    pub fn new(indicator: char) -> Self {
        Self {
            indicator,
            admin_roles: BTreeSet::new(),
            created_at: chrono::Utc::now().timestamp(),
            state: S::default(),
        }
    }
}

/// Shared handle to a cached tenant configuration.
///
/// The lock is synchronous: take it, read or mutate, release it. Guards
/// cannot be held across `.await`.
pub type TenantHandle<S> = Arc<RwLock<TenantConfig<S>>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Counts {
        hits: BTreeMap<String, u32>,
    }

    #[test]
    fn older_files_without_state_still_load() {
        let cfg: TenantConfig<Counts> = serde_json::from_str(r#"{"indicator":"!"}"#).unwrap();
        assert_eq!(cfg.indicator, '!');
        assert!(cfg.admin_roles.is_empty());
        assert_eq!(cfg.state, Counts::default());
    }

    #[test]
    fn json_shape() {
        let mut cfg: TenantConfig<Counts> = TenantConfig::new('?');
        cfg.created_at = 0;
        cfg.admin_roles.insert(RoleId(5));
        cfg.state.hits.insert("x".into(), 2);
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(
            json,
            r#"{"indicator":"?","admin_roles":[5],"created_at":0,"state":{"hits":{"x":2}}}"#
        );
    }
}
