//! Shared settings plumbing for Parley
//!
//! Two sources feed every Parley setting:
//! - JSON files in the Parley config directory (~/.config/parley/)
//! - `PARLEY_*` environment variables, which override the files
//!
//! Call [`init`] at application startup to bootstrap the config directory.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Name of the directory under the platform config dir
const APP_DIR: &str = "parley";

/// Prefix shared by every Parley environment variable
pub const ENV_PREFIX: &str = "PARLEY_";

/// Initialize the Parley config directory.
///
/// Creates ~/.config/parley/ if it doesn't exist.
/// Call this once at application startup.
pub fn init() -> Result<PathBuf> {
    ensure_config_dir()
}

/// Get the Parley config directory (~/.config/parley/)
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR))
}

/// Get the path to a settings file within the Parley config directory
pub fn config_path(filename: &str) -> Option<PathBuf> {
    config_dir().map(|p| p.join(filename))
}

/// Load a JSON settings file from the Parley config directory
pub fn load_json<T: DeserializeOwned>(filename: &str) -> Result<T> {
    let path = config_path(filename).context("Could not determine config directory")?;
    load_json_file(&path)
}

/// Load a JSON settings file from an arbitrary path
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Check if a settings file exists in the Parley config directory
pub fn config_exists(filename: &str) -> bool {
    config_path(filename).is_some_and(|p| p.exists())
}

/// Ensure the Parley config directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir().context("Could not determine config directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    Ok(dir)
}

/// Write a value as pretty-printed JSON, creating parent directories
pub fn save_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}

// === Environment ===

/// Full variable name for a setting, e.g. `API_URL` -> `PARLEY_API_URL`
pub fn env_key(name: &str) -> String {
    format!("{}{}", ENV_PREFIX, name.to_ascii_uppercase())
}

/// Read `PARLEY_<name>` from the process environment
pub fn env_var(name: &str) -> Option<String> {
    env_lookup(name, |key| std::env::var(key).ok())
}

/// Read `PARLEY_<name>` through `lookup`; blank values count as unset
///
/// The value is returned untrimmed.
pub fn env_lookup<F>(name: &str, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(&env_key(name)).filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_config_dir() {
        let dir = config_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().ends_with("parley"));
    }

    #[test]
    fn test_config_path() {
        let path = config_path("server.json").unwrap();
        assert!(path.ends_with("parley/server.json"));
    }

    #[test]
    fn test_save_creates_parent_and_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut value = BTreeMap::new();
        value.insert("base_url".to_string(), "http://localhost:8080".to_string());
        save_json_file(&path, &value).unwrap();

        let loaded: BTreeMap<String, String> = load_json_file(&path).unwrap();
        assert_eq!(loaded, value);
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let err = load_json_file::<BTreeMap<String, String>>(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_env_key() {
        assert_eq!(env_key("API_URL"), "PARLEY_API_URL");
        assert_eq!(env_key("token"), "PARLEY_TOKEN");
    }

    #[test]
    fn test_env_lookup_prefixes_and_skips_blank() {
        let lookup = |key: &str| match key {
            "PARLEY_TOKEN" => Some(" abc ".to_string()),
            "PARLEY_PASSWORD" => Some("   ".to_string()),
            _ => None,
        };
        assert_eq!(env_lookup("TOKEN", lookup), Some(" abc ".to_string()));
        assert_eq!(env_lookup("PASSWORD", lookup), None);
        assert_eq!(env_lookup("USERNAME", lookup), None);
    }
}
