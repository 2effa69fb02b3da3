//! Connection credential file.
//!
//! The credential is tenant-independent and loaded once at startup. It is
//! wiped from memory when dropped and never printed.

use super::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Bot credential used to identify with the gateway.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    /// Build credentials from a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Load a TOML credential file (`token = "..."`).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let credentials: Credentials = toml::from_str(&content)?;
        if credentials.token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        Ok(credentials)
    }

    /// The raw token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_token_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "token = \"abc.def\"").unwrap();
        let creds = Credentials::load(file.path()).unwrap();
        assert_eq!(creds.token(), "abc.def");
    }

    #[test]
    fn empty_token_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "token = \"  \"").unwrap();
        assert!(matches!(
            Credentials::load(file.path()),
            Err(ConfigError::EmptyToken)
        ));
    }

    #[test]
    fn debug_output_is_redacted() {
        let creds = Credentials::new("secret-token");
        let shown = format!("{:?}", creds);
        assert!(!shown.contains("secret-token"));
    }
}
