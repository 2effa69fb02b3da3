//! Mention parsing and rendering.
//!
//! Commands accept users and roles either as mentions (`<@123>`, `<@!123>`,
//! `<@&123>`) or as bare snowflakes.

use crate::id::{RoleId, UserId};

/// Parse a user mention (`<@id>` / `<@!id>`) or a bare id.
pub fn parse_user(s: &str) -> Option<UserId> {
    let s = s.trim();
    let inner = match s.strip_prefix("<@").and_then(|r| r.strip_suffix('>')) {
        Some(inner) => inner.strip_prefix('!').unwrap_or(inner),
        None => s,
    };
    if inner.starts_with('&') {
        return None;
    }
    inner.parse().ok()
}

/// Parse a role mention (`<@&id>`) or a bare id.
pub fn parse_role(s: &str) -> Option<RoleId> {
    let s = s.trim();
    let inner = s
        .strip_prefix("<@&")
        .and_then(|r| r.strip_suffix('>'))
        .unwrap_or(s);
    inner.parse().ok()
}

/// Render a user mention.
pub fn user(id: UserId) -> String {
    format!("<@{}>", id)
}

/// Render a role mention.
pub fn role(id: RoleId) -> String {
    format!("<@&{}>", id)
}
