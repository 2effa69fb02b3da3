//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Connection Defaults
// =============================================================================

pub fn default_credentials_path() -> String {
    "credentials.toml".to_string()
}

pub fn default_request_timeout() -> u64 {
    10
}

// =============================================================================
// Storage / Hub Defaults
// =============================================================================

pub fn default_storage_path() -> String {
    "data".to_string()
}

pub fn default_drain_timeout() -> u64 {
    5
}
