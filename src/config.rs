//! Application configuration, persisted as TOML under the vendora home.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the vendor assistant backend
    pub endpoint: String,

    /// Upper bound on a single chat request, in seconds
    pub request_timeout_secs: u64,

    /// Vendora home directory
    pub vendora_home: PathBuf,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            theme: "dark".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            endpoint: "http://localhost:8000".to_string(),
            request_timeout_secs: 60,
            vendora_home: home.join(".vendora"),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the home directory, creating it on first run.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let vendora_home = home.join(".vendora");
        let config_path = vendora_home.join("config.toml");

        fs::create_dir_all(&vendora_home).context("Failed to create .vendora directory")?;

        let mut config = if config_path.exists() {
            let content =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            // seed an editable config on first run
            let config = Config {
                vendora_home: vendora_home.clone(),
                ..Config::default()
            };
            config.save()?;
            config
        };

        config.vendora_home = vendora_home;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.vendora_home.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Where diagnostics go; stderr belongs to the terminal UI.
    pub fn log_path(&self) -> PathBuf {
        self.vendora_home.join("vendora.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_local_backend() {
        let config = Config::default();
        assert_eq!(config.endpoint, "http://localhost:8000");
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.vendora_home = dir.path().to_path_buf();
        config.endpoint = "http://chat.internal:9000".to_string();
        config.request_timeout_secs = 15;
        config.save().unwrap();

        let content = fs::read_to_string(dir.path().join("config.toml")).unwrap();
        let reloaded: Config = toml::from_str(&content).unwrap();
        assert_eq!(reloaded.endpoint, "http://chat.internal:9000");
        assert_eq!(reloaded.request_timeout_secs, 15);
        assert_eq!(reloaded.ui.theme, "dark");
    }
}
