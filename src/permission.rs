//! Caller permission resolution.
//!
//! Each inbound command message is resolved to a single [`PermissionLevel`]
//! once per extension, before any keyword matching happens. Commands declared
//! above that level are skipped outright, so an unauthorized caller cannot
//! tell an admin command apart from a command that does not exist.

use crate::gateway::Platform;
use hubbot_proto::{GuildId, RoleId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// Access levels in increasing order of privilege.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    #[default]
    Unrestricted,
    Admin,
    Owner,
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unrestricted => "unrestricted",
            Self::Admin => "admin",
            Self::Owner => "owner",
        })
    }
}

/// Compute the level from already-known facts.
///
/// - the guild owner → `Owner`
/// - any role in the admin allowlist → `Admin`
/// - otherwise → `Unrestricted`
pub fn level_for(is_owner: bool, roles: &[RoleId], admin_roles: &BTreeSet<RoleId>) -> PermissionLevel {
    if is_owner {
        return PermissionLevel::Owner;
    }
    if roles.iter().any(|role| admin_roles.contains(role)) {
        return PermissionLevel::Admin;
    }
    PermissionLevel::Unrestricted
}

/// Resolve the caller's level for one message.
///
/// `event_roles` are the member roles attached to the event, when the
/// platform supplied them; otherwise they are looked up. A failed lookup
/// degrades to the lower level instead of failing the message.
pub async fn resolve(
    platform: &dyn Platform,
    guild: GuildId,
    user: UserId,
    event_roles: Option<&[RoleId]>,
    admin_roles: &BTreeSet<RoleId>,
) -> PermissionLevel {
    let is_owner = match platform.guild_owner(guild).await {
        Ok(owner) => owner == user,
        Err(e) => {
            warn!(guild = %guild, error = %e, "Guild owner lookup failed");
            false
        }
    };
    if is_owner {
        return PermissionLevel::Owner;
    }

    // Nobody can be an admin of a guild that has no admin roles configured;
    // skip the member lookup entirely.
    if admin_roles.is_empty() {
        return PermissionLevel::Unrestricted;
    }

    let fetched;
    let roles = match event_roles {
        Some(roles) => roles,
        None => {
            fetched = match platform.member_roles(guild, user).await {
                Ok(roles) => roles,
                Err(e) => {
                    warn!(guild = %guild, user = %user, error = %e, "Member role lookup failed");
                    Vec::new()
                }
            };
            &fetched
        }
    };

    level_for(false, roles, admin_roles)
}
