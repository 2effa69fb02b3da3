//! Feature extensions shipped with the binary.

pub mod points;
pub mod purge;
pub mod roles;

use crate::config::Config;
use crate::error::RegistrationError;
use crate::extension::{Extension, Module};
use crate::storage::ConfigStorage;
use std::sync::Arc;
use tracing::info;

/// Names accepted under `[extensions.<name>]`.
pub const KNOWN: &[&str] = &[points::NAME, roles::NAME, purge::NAME];

/// Build one extension by name with the given default indicator.
pub fn build(
    name: &str,
    indicator: Option<char>,
    storage: Arc<dyn ConfigStorage>,
) -> Result<Option<Arc<dyn Extension>>, RegistrationError> {
    let extension: Arc<dyn Extension> = match name {
        points::NAME => Arc::new(
            Module::builder(points::NAME)
                .indicator(indicator.unwrap_or(points::DEFAULT_INDICATOR))
                .commands(points::commands())
                .reaction(points::AwardOnReaction)
                .build(storage)?,
        ),
        roles::NAME => Arc::new(
            Module::builder(roles::NAME)
                .indicator(indicator.unwrap_or(roles::DEFAULT_INDICATOR))
                .commands(roles::commands())
                .reaction(roles::RoleOnReaction)
                .build(storage)?,
        ),
        purge::NAME => Arc::new(
            Module::builder(purge::NAME)
                .indicator(indicator.unwrap_or(purge::DEFAULT_INDICATOR))
                .commands(purge::commands())
                .build(storage)?,
        ),
        _ => return Ok(None),
    };
    Ok(Some(extension))
}

/// Every known extension the configuration leaves enabled, in `KNOWN` order.
pub fn build_enabled(
    config: &Config,
    storage: Arc<dyn ConfigStorage>,
) -> Result<Vec<Arc<dyn Extension>>, RegistrationError> {
    let mut extensions = Vec::new();
    for name in KNOWN {
        let settings = config.extension(name);
        if !settings.enabled {
            info!(extension = %name, "Extension disabled");
            continue;
        }
        if let Some(extension) = build(name, settings.indicator, Arc::clone(&storage))? {
            extensions.push(extension);
        }
    }
    Ok(extensions)
}
