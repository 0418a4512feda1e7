//! Bot configuration
//!
//! Loaded from a YAML file; every field has a default, so an absent file
//! or an empty document is a valid configuration.
//!
//! ```yaml
//! index_url: https://thunderstore.io/c/hollow-knight-silksong/api/v1/package-listing-index/
//! refresh_interval_minutes: 30
//! fetch_timeout_seconds: 120
//! hidden_dependencies:
//!   - BepInEx-BepInExPack
//! max_concurrent_lookups: 16
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{FixerError, Result};
use crate::summary::{SummarySettings, DEFAULT_EMBED_COLOR};

/// Default package listing index
pub const DEFAULT_INDEX_URL: &str =
    "https://thunderstore.io/c/hollow-knight-silksong/api/v1/package-listing-index/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Package listing index of the registry community
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Delay between the end of one refresh and the start of the next
    #[serde(default = "default_refresh_interval_minutes")]
    pub refresh_interval_minutes: u64,

    /// Upper bound for one complete registry fetch
    #[serde(default = "default_fetch_timeout_seconds")]
    pub fetch_timeout_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Dependencies whose id contains any of these are never listed in summaries
    #[serde(default = "default_hidden_dependencies")]
    pub hidden_dependencies: Vec<String>,

    /// Cap on lookups running at once; unset means unbounded
    #[serde(default)]
    pub max_concurrent_lookups: Option<usize>,

    #[serde(default = "default_embed_color")]
    pub embed_color: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            refresh_interval_minutes: default_refresh_interval_minutes(),
            fetch_timeout_seconds: default_fetch_timeout_seconds(),
            user_agent: default_user_agent(),
            hidden_dependencies: default_hidden_dependencies(),
            max_concurrent_lookups: None,
            embed_color: default_embed_color(),
        }
    }
}

fn default_index_url() -> String {
    DEFAULT_INDEX_URL.to_string()
}

fn default_refresh_interval_minutes() -> u64 {
    30
}

fn default_fetch_timeout_seconds() -> u64 {
    120
}

fn default_user_agent() -> String {
    concat!("fixerbot/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_hidden_dependencies() -> Vec<String> {
    vec!["BepInEx-BepInExPack".to_string()]
}

fn default_embed_color() -> u32 {
    DEFAULT_EMBED_COLOR
}

impl BotConfig {
    /// Load and validate configuration; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                FixerError::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            Self::from_yaml(&content)?
        } else {
            debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(content)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.index_url.starts_with("http://") && !self.index_url.starts_with("https://") {
            return Err(FixerError::Config(format!(
                "index_url must start with http:// or https://, got '{}'",
                self.index_url
            )));
        }
        if self.refresh_interval_minutes == 0 {
            return Err(FixerError::Config(
                "refresh_interval_minutes must be at least 1".to_string(),
            ));
        }
        if self.fetch_timeout_seconds == 0 {
            return Err(FixerError::Config(
                "fetch_timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_lookups == Some(0) {
            return Err(FixerError::Config(
                "max_concurrent_lookups must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes.saturating_mul(60))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }

    pub fn summary_settings(&self) -> SummarySettings {
        SummarySettings {
            hidden_dependencies: self.hidden_dependencies.clone(),
            embed_color: self.embed_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.index_url, DEFAULT_INDEX_URL);
        assert_eq!(config.refresh_interval(), Duration::from_secs(30 * 60));
        assert_eq!(config.max_concurrent_lookups, None);
        assert_eq!(config.summary_settings(), SummarySettings::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = BotConfig::from_yaml("refresh_interval_minutes: 5\nmax_concurrent_lookups: 8\n")
            .unwrap();
        assert_eq!(config.refresh_interval_minutes, 5);
        assert_eq!(config.max_concurrent_lookups, Some(8));
        assert_eq!(config.fetch_timeout_seconds, 120);
        assert_eq!(config.hidden_dependencies, vec!["BepInEx-BepInExPack"]);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(BotConfig::from_yaml("  \n").unwrap(), BotConfig::default());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = BotConfig::load(&temp_dir.path().join("fixerbot.yaml")).unwrap();
        assert_eq!(config, BotConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fixerbot.yaml");
        std::fs::write(&path, "index_url: https://example.com/index/\nembed_color: 255\n").unwrap();

        let config = BotConfig::load(&path).unwrap();
        assert_eq!(config.index_url, "https://example.com/index/");
        assert_eq!(config.embed_color, 255);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fixerbot.yaml");

        std::fs::write(&path, "index_url: ftp://example.com\n").unwrap();
        let err = BotConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("index_url"));

        std::fs::write(&path, "refresh_interval_minutes: 0\n").unwrap();
        assert!(BotConfig::load(&path).is_err());

        std::fs::write(&path, "max_concurrent_lookups: 0\n").unwrap();
        assert!(BotConfig::load(&path).is_err());
    }

    #[test]
    fn test_huge_refresh_interval_saturates() {
        let config = BotConfig {
            refresh_interval_minutes: u64::MAX,
            ..BotConfig::default()
        };
        config.validate().unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = BotConfig::from_yaml("refresh_interval_minutes: [oops").unwrap_err();
        assert!(matches!(err, FixerError::YamlSerialization(_)));
    }
}
