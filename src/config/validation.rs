//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("connection.url is required")]
    MissingUrl,
    #[error("connection.url must use ws:// or wss://, got '{0}'")]
    InvalidUrlScheme(String),
    #[error("connection.credentials does not exist: {0}")]
    CredentialsNotFound(String),
    #[error("connection.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,
    #[error("extensions.{extension}.indicator must be a symbol, got '{indicator}'")]
    InvalidIndicator { extension: String, indicator: char },
    #[error("unknown extension '{0}'")]
    UnknownExtension(String),
}

/// Whether `c` may prefix command messages.
pub fn is_valid_indicator(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace() && !c.is_control()
}

/// Validate a configuration, returning all errors found.
///
/// `known_extensions` lists the extension names the binary can build.
pub fn validate(config: &Config, known_extensions: &[&str]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let url = config.connection.url.trim();
    if url.is_empty() {
        errors.push(ValidationError::MissingUrl);
    } else if !url.starts_with("ws://") && !url.starts_with("wss://") {
        errors.push(ValidationError::InvalidUrlScheme(url.to_string()));
    }

    if !Path::new(&config.connection.credentials).exists() {
        errors.push(ValidationError::CredentialsNotFound(
            config.connection.credentials.clone(),
        ));
    }

    if config.connection.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    for (name, ext) in &config.extensions {
        if !known_extensions.contains(&name.as_str()) {
            errors.push(ValidationError::UnknownExtension(name.clone()));
        }
        if let Some(indicator) = ext.indicator
            && !is_valid_indicator(indicator)
        {
            errors.push(ValidationError::InvalidIndicator {
                extension: name.clone(),
                indicator,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &str, credentials: &str) -> Config {
        toml::from_str(&format!(
            "[connection]\nurl = \"wss://gw.example\"\ncredentials = {:?}\n{}",
            credentials, extra
        ))
        .unwrap()
    }

    #[test]
    fn valid_config_passes() {
        let creds = tempfile::NamedTempFile::new().unwrap();
        let config = parse("", creds.path().to_str().unwrap());
        assert_eq!(validate(&config, &["points"]), Ok(()));
    }

    #[test]
    fn all_errors_are_reported() {
        let config = parse(
            "[extensions.points]\nindicator = \"a\"\n[extensions.nope]\n",
            "/definitely/not/here.toml",
        );
        let errors = validate(&config, &["points"]).unwrap_err();
        assert!(errors.contains(&ValidationError::CredentialsNotFound(
            "/definitely/not/here.toml".into()
        )));
        assert!(errors.contains(&ValidationError::InvalidIndicator {
            extension: "points".into(),
            indicator: 'a'
        }));
        assert!(errors.contains(&ValidationError::UnknownExtension("nope".into())));
    }

    #[test]
    fn url_scheme_is_checked() {
        let creds = tempfile::NamedTempFile::new().unwrap();
        let mut config = parse("", creds.path().to_str().unwrap());
        config.connection.url = "https://gw.example".into();
        let errors = validate(&config, &[]).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidUrlScheme("https://gw.example".into())]
        );
    }

    #[test]
    fn indicator_rules() {
        assert!(is_valid_indicator('!'));
        assert!(is_valid_indicator('%'));
        assert!(!is_valid_indicator('x'));
        assert!(!is_valid_indicator('7'));
        assert!(!is_valid_indicator(' '));
    }
}
