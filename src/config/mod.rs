// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Taxis

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Grant persistence settings
    #[serde(default)]
    pub grant: GrantConfig,

    /// Timer-loop settings
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GrantConfig {
    /// File holding the persisted grant (JSON key-value store)
    #[serde(default = "default_store_path")]
    pub store_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RunConfig {
    /// Seconds between organize passes in `taxis run`
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

// Default value functions
fn default_store_path() -> String { "taxis_grants.json".to_string() }
fn default_interval() -> u64 { 300 }

impl Default for GrantConfig {
    fn default() -> Self {
        Self { store_path: default_store_path() }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { interval_secs: default_interval() }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            grant: GrantConfig::default(),
            run: RunConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::TaxisError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_absent() {
        let config = AppConfig::load(Path::new("/nonexistent/config.json")).unwrap();
        assert_eq!(config.grant.store_path, "taxis_grants.json");
        assert_eq!(config.run.interval_secs, 300);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.run.interval_secs = 60;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.run.interval_secs, 60);
        assert_eq!(loaded.grant.store_path, config.grant.store_path);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"run": {"interval_secs": 30}}"#).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.run.interval_secs, 30);
        assert_eq!(loaded.grant.store_path, "taxis_grants.json");
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();

        assert!(AppConfig::load(&path).is_err());
    }
}
