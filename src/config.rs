//! Decoder configuration with TOML and environment variable support

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do when a registry lists the same plugin type twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePluginPolicy {
    /// Later record overwrites the earlier one (default, logged as a warning)
    LastWins,
    /// Treat the account as malformed
    Reject,
}

impl std::str::FromStr for DuplicatePluginPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "last_wins" => Ok(Self::LastWins),
            "reject" => Ok(Self::Reject),
            other => Err(anyhow!("unknown duplicate plugin policy '{}'", other)),
        }
    }
}

/// Knobs for the tolerant account decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Bytes skipped for a registry tag this version does not recognize
    ///
    /// Unknown tags are assumed to be a single byte on the wire; if a future tag is
    /// wider, the entries after it misalign.
    pub unknown_tag_width: usize,

    /// Handling of two registry records with the same plugin type
    pub duplicate_plugins: DuplicatePluginPolicy,

    /// Keep raw bytes when JSON adapter data fails to parse instead of failing the decode
    pub json_fallback_to_binary: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            unknown_tag_width: 1,
            duplicate_plugins: DuplicatePluginPolicy::LastWins,
            json_fallback_to_binary: true,
        }
    }
}

impl DecoderConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: DecoderConfig =
            toml::from_str(&contents).map_err(|e| anyhow!("Failed to parse TOML config: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    /// Environment variables override TOML values
    pub fn from_env(&mut self) -> Result<()> {
        dotenvy::dotenv().ok();

        if let Ok(width) = std::env::var("ASSET_PLUGINS_UNKNOWN_TAG_WIDTH") {
            self.unknown_tag_width = width
                .parse()
                .map_err(|e| anyhow!("Invalid ASSET_PLUGINS_UNKNOWN_TAG_WIDTH: {}", e))?;
        }

        if let Ok(policy) = std::env::var("ASSET_PLUGINS_DUPLICATE_PLUGINS") {
            self.duplicate_plugins = policy
                .parse()
                .context("Invalid ASSET_PLUGINS_DUPLICATE_PLUGINS")?;
        }

        if let Ok(fallback) = std::env::var("ASSET_PLUGINS_JSON_FALLBACK") {
            self.json_fallback_to_binary = fallback
                .parse()
                .map_err(|e| anyhow!("Invalid ASSET_PLUGINS_JSON_FALLBACK: {}", e))?;
        }

        self.validate()?;
        Ok(())
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.unknown_tag_width == 0 {
            return Err(anyhow!("unknown_tag_width must be > 0"));
        }
        Ok(())
    }

    /// Create configuration from default with environment overrides
    pub fn with_env_overrides() -> Result<Self> {
        let mut config = Self::default();
        config.from_env()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_valid() {
        let config = DecoderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.unknown_tag_width, 1);
        assert_eq!(config.duplicate_plugins, DuplicatePluginPolicy::LastWins);
    }

    #[test]
    fn test_invalid_tag_width() {
        let config = DecoderConfig {
            unknown_tag_width: 0,
            ..DecoderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "duplicate_plugins = \"reject\"").unwrap();

        let config = DecoderConfig::from_file(file.path()).unwrap();
        assert_eq!(config.duplicate_plugins, DuplicatePluginPolicy::Reject);
        assert_eq!(config.unknown_tag_width, 1);
        assert!(config.json_fallback_to_binary);
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "unknown_tag_width = 0").unwrap();
        assert!(DecoderConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "last_wins".parse::<DuplicatePluginPolicy>().unwrap(),
            DuplicatePluginPolicy::LastWins
        );
        assert!("first_wins".parse::<DuplicatePluginPolicy>().is_err());
    }
}
