//! Configuration
//!
//! Loaded from `~/.config/roster-cli/config.toml` (or `--config`), then
//! overridden by environment variables. A `.env` file in the working
//! directory is read first.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_BASE_URL: &str = "ROSTER_BASE_URL";
pub const ENV_API_TOKEN: &str = "ROSTER_API_TOKEN";
pub const ENV_CSRF_TOKEN: &str = "ROSTER_CSRF_TOKEN";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL, e.g. `https://roster.example.edu`
    pub base_url: Option<String>,
    /// Bearer token attached to every request
    pub api_token: Option<String>,
    /// Token sent as `X-CSRFToken` on mutating calls
    pub csrf_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            csrf_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL, required by every remote command
    pub fn require_base_url(&self) -> Result<&str> {
        self.base_url.as_deref().filter(|url| !url.trim().is_empty()).ok_or_else(|| {
            anyhow::anyhow!(
                "No API base URL configured. Set [api] base_url in the config file or {}.",
                ENV_BASE_URL
            )
        })
    }

    pub fn require_csrf_token(&self) -> Result<&str> {
        self.csrf_token.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "No CSRF token configured. Set [api] csrf_token in the config file or {}.",
                ENV_CSRF_TOKEN
            )
        })
    }
}

/// Default config file location (~/.config/roster-cli/config.toml)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roster-cli")
        .join("config.toml")
}

impl Config {
    /// Load config from `path` (or the default location) plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a TOML file. A missing file means defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in practice)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_BASE_URL) {
            self.api.base_url = Some(url);
        }
        if let Some(token) = non_empty(ENV_API_TOKEN) {
            self.api.api_token = Some(token);
        }
        if let Some(token) = non_empty(ENV_CSRF_TOKEN) {
            self.api.csrf_token = Some(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://roster.example.edu"
            api_token = "abc"
            csrf_token = "xyz"
            timeout_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.api.require_base_url().unwrap(), "https://roster.example.edu");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.api.csrf_token.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.api.require_base_url().is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir().join("roster-cli-does-not-exist/config.toml");
        let config = Config::from_file(&path).unwrap();
        assert!(config.api.base_url.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://old.example.edu"
            api_token = "file-token"
            "#,
        )
        .unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, "https://new.example.edu"),
            (ENV_API_TOKEN, ""),
            (ENV_CSRF_TOKEN, "from-env"),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url.as_deref(), Some("https://new.example.edu"));
        // Empty values do not override
        assert_eq!(config.api.api_token.as_deref(), Some("file-token"));
        assert_eq!(config.api.csrf_token.as_deref(), Some("from-env"));
    }
}
