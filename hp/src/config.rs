//! HealthPlan configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main HealthPlan configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Planning service configuration
    pub api: ApiConfig,
}

/// Project-local config file, checked before the user config
const LOCAL_CONFIG: &str = ".healthplan.yml";

impl Config {
    /// Load configuration, then let the environment override the base URL
    ///
    /// An explicit path must load. Otherwise the first readable file of
    /// `./.healthplan.yml` and `~/.config/healthplan/healthplan.yml` wins,
    /// falling back to defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        Self::load_with_env(config_path, |name| std::env::var(name).ok())
    }

    /// `load` with an injected environment lookup
    pub fn load_with_env<F>(config_path: Option<&PathBuf>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match config_path {
            Some(path) => Self::from_file(path).context(format!("Failed to load config from {}", path.display()))?,
            None => Self::first_readable(&Self::default_sources()).unwrap_or_else(|| {
                info!("No config file found, using defaults");
                Self::default()
            }),
        };
        config.api.apply_env_override(lookup);
        Ok(config)
    }

    fn default_sources() -> Vec<PathBuf> {
        let user = dirs::config_dir().map(|dir| dir.join("healthplan").join("healthplan.yml"));
        std::iter::once(PathBuf::from(LOCAL_CONFIG)).chain(user).collect()
    }

    /// First source that exists and parses; broken files are skipped with a warning
    fn first_readable(sources: &[PathBuf]) -> Option<Self> {
        sources
            .iter()
            .filter(|path| path.exists())
            .find_map(|path| match Self::from_file(path) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "first_readable: skipping config");
                    None
                }
            })
    }

    fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "from_file: called");
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}

/// Planning service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Service base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable that overrides the base URL when set
    #[serde(rename = "base-url-env")]
    pub base_url_env: String,

    /// Timeout for non-streaming requests in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Connection timeout in milliseconds (applies to streams too)
    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            base_url_env: "HEALTHPLAN_API_URL".to_string(),
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
        }
    }
}

impl ApiConfig {
    /// Replace the base URL from the configured environment variable
    ///
    /// `lookup` resolves a variable name; empty values are ignored.
    pub fn apply_env_override<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(&self.base_url_env).filter(|v| !v.trim().is_empty()) {
            debug!(env = %self.base_url_env, %url, "apply_env_override: base URL overridden");
            self.base_url = url;
        }
    }

    /// Base URL without trailing slashes
    pub fn resolved_base_url(&self) -> String {
        self.base_url.trim().trim_end_matches('/').to_string()
    }
}
