//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/graft/config.toml)
//! 3. Environment variables (GRAFT_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::FALLBACK_LOCALE;

/// Environment variable prefix
const ENV_PREFIX: &str = "GRAFT";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Content space to query
    #[serde(default)]
    pub space_id: Option<String>,

    /// Delivery (or preview) API token
    #[serde(default)]
    pub access_token: Option<String>,

    /// Space environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// API host (cdn.contentful.com, preview.contentful.com, ...)
    #[serde(default = "default_host")]
    pub host: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Locale assumed for payload files that come without a locales file
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            space_id: None,
            access_token: None,
            environment: default_environment(),
            host: default_host(),
            timeout_secs: default_timeout_secs(),
            default_locale: default_locale(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (GRAFT_SPACE_ID, GRAFT_ACCESS_TOKEN, ...)
    /// 2. Config file (~/.config/graft/config.toml or GRAFT_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load from an explicit path when given, else the default location
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // GRAFT_SPACE_ID
        if let Ok(val) = std::env::var(format!("{}_SPACE_ID", ENV_PREFIX)) {
            self.space_id = if val.is_empty() { None } else { Some(val) };
        }

        // GRAFT_ACCESS_TOKEN
        if let Ok(val) = std::env::var(format!("{}_ACCESS_TOKEN", ENV_PREFIX)) {
            self.access_token = if val.is_empty() { None } else { Some(val) };
        }

        // GRAFT_ENVIRONMENT
        if let Ok(val) = std::env::var(format!("{}_ENVIRONMENT", ENV_PREFIX)) {
            if !val.is_empty() {
                self.environment = val;
            }
        }

        // GRAFT_HOST
        if let Ok(val) = std::env::var(format!("{}_HOST", ENV_PREFIX)) {
            if !val.is_empty() {
                self.host = val;
            }
        }

        // GRAFT_TIMEOUT_SECS (ignored unless it parses)
        if let Ok(val) = std::env::var(format!("{}_TIMEOUT_SECS", ENV_PREFIX)) {
            if let Ok(secs) = val.parse() {
                self.timeout_secs = secs;
            }
        }

        // GRAFT_DEFAULT_LOCALE
        if let Ok(val) = std::env::var(format!("{}_DEFAULT_LOCALE", ENV_PREFIX)) {
            if !val.is_empty() {
                self.default_locale = val;
            }
        }
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with GRAFT_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("graft")
            .join("config.toml")
    }

    /// Base URL of the configured space environment
    ///
    /// Fails when no space is configured.
    pub fn base_url(&self) -> Result<String> {
        let space = self
            .space_id
            .as_deref()
            .context("Space ID not configured. Set it with: graft config set space_id <id>")?;
        Ok(format!(
            "https://{}/spaces/{}/environments/{}",
            self.host, space, self.environment
        ))
    }
}

fn default_environment() -> String {
    "master".to_string()
}

fn default_host() -> String {
    "cdn.contentful.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_locale() -> String {
    FALLBACK_LOCALE.to_string()
}
