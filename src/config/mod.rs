//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::models::DEFAULT_PAST_MATCH_COUNT;
use crate::parse_duration;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Aggregate cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_ttl_seconds() -> u64 {
    900
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Leaderboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Clans with fewer linked members get no leaderboard
    #[serde(default = "default_min_linked_members")]
    pub min_linked_members: usize,

    /// Time between scheduled passes, e.g. "168h"
    #[serde(default = "default_schedule_interval")]
    pub schedule_interval: String,
}

fn default_min_linked_members() -> usize {
    2
}

fn default_schedule_interval() -> String {
    "168h".to_string()
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            min_linked_members: default_min_linked_members(),
            schedule_interval: default_schedule_interval(),
        }
    }
}

impl LeaderboardConfig {
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        match parse_duration(&self.schedule_interval) {
            Some(d) if !d.is_zero() => Ok(d),
            _ => Err(ConfigError::ValidationError(format!(
                "Invalid leaderboard schedule interval: {:?}",
                self.schedule_interval
            ))),
        }
    }
}

/// Player statistics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Window size when a request does not give one
    #[serde(default = "default_past_match_count")]
    pub default_past_match_count: usize,
}

fn default_past_match_count() -> usize {
    DEFAULT_PAST_MATCH_COUNT
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            default_past_match_count: default_past_match_count(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub leaderboard: LeaderboardConfig,

    #[serde(default)]
    pub stats: StatsConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            leaderboard: LeaderboardConfig::default(),
            stats: StatsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Like `from_file`, but a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.cache.ttl_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Cache TTL must be greater than 0".to_string(),
            ));
        }

        if self.leaderboard.min_linked_members == 0 {
            return Err(ConfigError::ValidationError(
                "Leaderboard min_linked_members must be at least 1".to_string(),
            ));
        }

        if self.stats.default_past_match_count == 0 {
            return Err(ConfigError::ValidationError(
                "Default past match count must be greater than 0".to_string(),
            ));
        }

        self.leaderboard.interval()?;

        Ok(())
    }
}
