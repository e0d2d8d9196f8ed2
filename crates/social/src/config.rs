//! Configuration loading for the backend connection
//!
//! Settings come from (in order of priority):
//! 1. Runtime environment variables (`PARLEY_API_URL`, `PARLEY_POLL_SECS`)
//! 2. JSON file (~/.config/parley/server.json)
//! 3. Built-in defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::ApiClient;
use crate::sync::{Conversation, ReconcileMode, SyncOptions};

/// Settings filename in the Parley config directory
const CONFIG_FILE: &str = "server.json";

/// Setting name of the backend URL override (`PARLEY_API_URL`)
pub const ENV_API_URL: &str = "API_URL";

/// Setting name of the poll interval override in seconds (`PARLEY_POLL_SECS`)
pub const ENV_POLL_SECS: &str = "POLL_SECS";

/// Shortest poll interval the config will accept
const MIN_POLL_SECS: u64 = 1;

/// Backend connection and sync settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub reconcile: ReconcileMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: ApiClient::DEFAULT_BASE_URL.to_string(),
            poll_interval_secs: 5,
            request_timeout_secs: ApiClient::DEFAULT_TIMEOUT.as_secs(),
            reconcile: ReconcileMode::Replace,
        }
    }
}

impl ServerConfig {
    /// Load settings from the config file (if any), then apply environment overrides
    pub fn load() -> Result<Self> {
        let base = if Self::exists() {
            config::load_json(CONFIG_FILE)?
        } else {
            Self::default()
        };

        base.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = config::load_json_file(path)?;
        Ok(config.normalized())
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse server config JSON")?;
        Ok(config.normalized())
    }

    /// Apply `PARLEY_*` overrides read through `lookup` (normally the process environment)
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = config::env_lookup(ENV_API_URL, &lookup) {
            self.base_url = url.trim().to_string();
        }

        if let Some(secs) = config::env_lookup(ENV_POLL_SECS, &lookup) {
            self.poll_interval_secs = secs.trim().parse().with_context(|| {
                format!(
                    "{} must be a whole number of seconds",
                    config::env_key(ENV_POLL_SECS)
                )
            })?;
        }

        Ok(self.normalized())
    }

    /// Save settings to the config directory, returning the path written
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::default_config_path().context("Could not determine config directory")?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a specific JSON file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        config::save_json_file(path, self)
    }

    /// Whether a settings file exists in the config directory
    pub fn exists() -> bool {
        config::config_exists(CONFIG_FILE)
    }

    /// Get the default settings path (~/.config/parley/server.json)
    pub fn default_config_path() -> Option<PathBuf> {
        config::config_path(CONFIG_FILE)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build an API client for the configured backend
    pub fn api_client(&self) -> Result<ApiClient> {
        ApiClient::with_timeout(&self.base_url, self.request_timeout())
            .with_context(|| format!("Invalid backend URL: {}", self.base_url))
    }

    /// Sync options for the given conversation
    pub fn sync_options(&self, conversation: Conversation) -> SyncOptions {
        SyncOptions {
            conversation,
            poll_interval: self.poll_interval(),
            reconcile: self.reconcile,
        }
    }

    fn normalized(mut self) -> Self {
        self.poll_interval_secs = self.poll_interval_secs.max(MIN_POLL_SECS);
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = ApiClient::DEFAULT_TIMEOUT.as_secs();
        }
        self
    }
}
