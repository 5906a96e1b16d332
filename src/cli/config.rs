//! TOML configuration file support.
//!
//! Identity-service settings can be specified in a config file instead of
//! CLI flags:
//!
//! ```toml
//! # camels-archive.toml
//! [identity]
//! base_url = "https://nomad-lab.eu/prod/v1/api"
//! timeout_secs = 10
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use camels_archive::extractor::ExtractorConfig;

/// Root configuration structure for camels-archive.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Identity-service settings.
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Configuration of the user-identity service client.
#[derive(Debug, Default, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the identity service. Unset disables lookups.
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Convert into the engine's extractor configuration.
    pub fn extractor_config(&self) -> ExtractorConfig {
        let defaults = ExtractorConfig::default();
        ExtractorConfig {
            identity_base_url: self.identity.base_url.clone(),
            identity_timeout: self
                .identity
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.identity_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [identity]
            base_url = "https://nomad-lab.eu/prod/v1/api"
            timeout_secs = 5
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(
            config.identity.base_url.as_deref(),
            Some("https://nomad-lab.eu/prod/v1/api")
        );
        assert_eq!(config.identity.timeout_secs, Some(5));

        let extractor = config.extractor_config();
        assert_eq!(extractor.identity_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.identity.base_url, None);
        assert_eq!(config.identity.timeout_secs, None);
    }
}
