//! Configuration loading and persistence.
//!
//! The configuration file lives at `<config dir>/tuner/config.json`. Values are
//! layered: defaults, then the file, then environment variables. Command line
//! flags are applied on top by the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::constants::DEFAULT_URL;

const CONFIG_FILE: &str = "config.json";

/// Configuration for the tuner client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// WebSocket endpoint of the tuner server.
    pub url: String,
    /// Node to pick when the server advertises it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_node: Option<String>,
    /// Print the rendered tree after every change in `watch`.
    pub print_on_change: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            preferred_node: None,
            print_on_change: true,
        }
    }
}

impl Config {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// `TUNER_CONFIG_DIR` overrides the platform config directory.
    pub fn config_dir() -> Result<PathBuf> {
        let dir = match std::env::var("TUNER_CONFIG_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::config_dir()
                .context("Could not determine config directory")?
                .join("tuner"),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        Ok(dir)
    }

    /// Loads configuration from file, with environment variable overrides.
    ///
    /// A missing or unreadable file falls back to defaults.
    pub fn load() -> Result<Self> {
        let dir = Self::config_dir()?;
        let mut config = Self::load_from(&dir).unwrap_or_else(|e| {
            log::debug!("[Config] Using defaults: {:#}", e);
            Self::default()
        });
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read `config.json` from `dir`.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Apply `TUNER_URL` and `TUNER_NODE` as looked up by `var`.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("TUNER_URL") {
            self.url = url;
        }
        if let Some(node) = var("TUNER_NODE") {
            self.preferred_node = Some(node).filter(|n| !n.is_empty());
        }
    }

    /// Persists the current configuration to the default directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_dir()?)
    }

    /// Write `config.json` into `dir`.
    pub fn save_to(&self, dir: &Path) -> Result<()> {
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Endpoint as a WebSocket URL.
    pub fn ws_url(&self) -> String {
        crate::ws::endpoint_url(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.url, "ws://127.0.0.1:8080/ws");
        assert_eq!(config.preferred_node, None);
        assert!(config.print_on_change);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().expect("temp dir");
        let config = Config {
            url: "ws://lab:9000/ws".to_string(),
            preferred_node: Some("robot".to_string()),
            print_on_change: false,
        };
        config.save_to(dir.path()).expect("saves");

        assert_eq!(Config::load_from(dir.path()).expect("loads"), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join(CONFIG_FILE), r#"{"preferred_node": "sim"}"#).expect("writes");

        let config = Config::load_from(dir.path()).expect("loads");
        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(config.preferred_node.as_deref(), Some("sim"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        assert!(Config::load_from(dir.path()).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("TUNER_URL", "http://box:8080/ws"), ("TUNER_NODE", "sim")]);
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.url, "http://box:8080/ws");
        assert_eq!(config.ws_url(), "ws://box:8080/ws");
        assert_eq!(config.preferred_node.as_deref(), Some("sim"));
    }

    #[test]
    fn test_empty_node_override_clears_preference() {
        let mut config = Config {
            preferred_node: Some("sim".to_string()),
            ..Config::default()
        };
        config.apply_overrides(|key| (key == "TUNER_NODE").then(String::new));
        assert_eq!(config.preferred_node, None);
    }
}
