//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/cinelog/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/cinelog/` (~/.config/cinelog/)
//! - State/Logs: `$XDG_STATE_HOME/cinelog/` (~/.local/state/cinelog/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Statistics engine configuration
    #[serde(default)]
    pub stats: StatsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Statistics engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    /// Maximum number of cached snapshots (one per scope)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Seconds before a cached snapshot is considered stale
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Number of entries in the top-watched ranking
    #[serde(default = "default_top_watched_limit")]
    pub top_watched_limit: usize,

    /// Minimum rated films for a month to qualify as best-rated
    #[serde(default = "default_best_month_min_ratings")]
    pub best_month_min_ratings: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
            top_watched_limit: default_top_watched_limit(),
            best_month_min_ratings: default_best_month_min_ratings(),
        }
    }
}

impl StatsConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(Error::Config(
                "stats.cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.cache_ttl_secs == 0 {
            return Err(Error::Config(
                "stats.cache_ttl_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_cache_capacity() -> usize {
    5
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_top_watched_limit() -> usize {
    6
}

fn default_best_month_min_ratings() -> usize {
    2
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.stats.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/cinelog/config.toml` (~/.config/cinelog/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("cinelog").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/cinelog/` (~/.local/state/cinelog/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("cinelog")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/cinelog/cinelog.log` (~/.local/state/cinelog/cinelog.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("cinelog.log")
    }
}
