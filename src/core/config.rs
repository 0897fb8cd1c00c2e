use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::system_monitor::CollectorConfig;

pub const DEFAULT_PROCESS_LIMIT: usize = 20;
pub const DEFAULT_CONNECTION_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Limit used by `processes` when the caller does not pass one
    #[serde(default = "default_process_limit")]
    pub default_process_limit: usize,
    /// Limit used by `connections` when the caller does not pass one
    #[serde(default = "default_connection_limit")]
    pub default_connection_limit: usize,
    /// Run the one-shot background hardware scan at startup
    #[serde(default = "default_true")]
    pub hardware_scan: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_process_limit() -> usize {
    DEFAULT_PROCESS_LIMIT
}

fn default_connection_limit() -> usize {
    DEFAULT_CONNECTION_LIMIT
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_process_limit: DEFAULT_PROCESS_LIMIT,
            default_connection_limit: DEFAULT_CONNECTION_LIMIT,
            hardware_scan: true,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load the config from the user config directory, falling back to defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load the config from an explicit path.
    ///
    /// A missing, empty or unparsable file yields the default config so a
    /// stale file from an older version never prevents startup.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        if data.trim().is_empty() {
            return Ok(Config::default());
        }

        Ok(serde_json::from_str(&data).unwrap_or_else(|e| {
            log::warn!(
                "Ignoring unreadable config file {:?}: {}",
                config_path,
                e
            );
            Config::default()
        }))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(config_path, data)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("vantasys").join("config.json"))
    }

    /// Parsed log level, `Info` when the stored string is not recognised
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            scan_hardware: self.hardware_scan,
        }
    }
}
