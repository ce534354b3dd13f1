//! Configuration management for the field health backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with FHI_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::{AlertPolicy, AnalysisPolicy, ZonePolicy};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Vegetation statistics provider configuration
    pub statistics: StatisticsConfig,

    /// Offline cache configuration
    pub cache: CacheConfig,

    /// Monitoring orchestration configuration
    #[serde(default)]
    pub monitoring: MonitoringConfig,

    /// Notification channel configuration
    pub notifications: NotificationConfig,

    /// Analyzer and fallback heuristics
    #[serde(default)]
    pub analysis: AnalysisPolicy,

    /// Variable-rate zone heuristics
    #[serde(default)]
    pub zones: ZonePolicy,

    /// Alert rule thresholds
    #[serde(default)]
    pub alerts: AlertPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatisticsConfig {
    /// Statistics API endpoint
    pub api_endpoint: String,

    /// Statistics API key
    pub api_key: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// How many days of imagery each query aggregates over
    pub lookback_days: i64,

    /// Interval between connectivity probes in seconds
    pub probe_interval_secs: u64,
}

impl StatisticsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Entry lifetime in hours
    pub ttl_hours: i64,

    /// Interval between expiry sweeps in seconds
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MonitoringConfig {
    /// Seed for problem-area sampling; entropy when absent
    pub random_seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    /// LINE Messaging API access token
    pub line_channel_access_token: Option<String>,

    /// SMS gateway endpoint
    pub sms_endpoint: Option<String>,

    /// SMS gateway API key
    pub sms_api_key: Option<String>,

    /// Sender id shown on SMS messages
    pub sms_sender_id: String,

    /// Per-channel delivery timeout in milliseconds
    pub channel_timeout_ms: u64,
}

impl NotificationConfig {
    pub fn channel_timeout(&self) -> Duration {
        Duration::from_millis(self.channel_timeout_ms)
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("FHI_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("statistics.timeout_ms", 15_000)?
            .set_default("statistics.lookback_days", 10)?
            .set_default("statistics.probe_interval_secs", 60)?
            .set_default("cache.ttl_hours", 24)?
            .set_default("cache.sweep_interval_secs", 86_400)?
            .set_default("notifications.sms_sender_id", "FieldHealth")?
            .set_default("notifications.channel_timeout_ms", 10_000)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (FHI_ prefix)
            .add_source(
                Environment::with_prefix("FHI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the cache or the background tasks
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("cache.ttl_hours", self.cache.ttl_hours > 0),
            ("cache.sweep_interval_secs", self.cache.sweep_interval_secs > 0),
            ("statistics.probe_interval_secs", self.statistics.probe_interval_secs > 0),
            ("statistics.timeout_ms", self.statistics.timeout_ms > 0),
            ("statistics.lookback_days", self.statistics.lookback_days > 0),
            ("notifications.channel_timeout_ms", self.notifications.channel_timeout_ms > 0),
        ];

        match positive.iter().find(|(_, ok)| !ok) {
            Some((key, _)) => Err(ConfigError::Message(format!("{} must be positive", key))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            environment: "test".to_string(),
            server: ServerConfig {
                port: 3000,
                host: "127.0.0.1".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/fhi".to_string(),
                max_connections: 5,
                min_connections: 1,
            },
            statistics: StatisticsConfig {
                api_endpoint: "http://localhost:9000".to_string(),
                api_key: "key".to_string(),
                timeout_ms: 15_000,
                lookback_days: 10,
                probe_interval_secs: 60,
            },
            cache: CacheConfig {
                ttl_hours: 24,
                sweep_interval_secs: 86_400,
            },
            monitoring: MonitoringConfig::default(),
            notifications: NotificationConfig {
                line_channel_access_token: None,
                sms_endpoint: None,
                sms_api_key: None,
                sms_sender_id: "FieldHealth".to_string(),
                channel_timeout_ms: 10_000,
            },
            analysis: AnalysisPolicy::default(),
            zones: ZonePolicy::default(),
            alerts: AlertPolicy::default(),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = valid_config();
        config.cache.ttl_hours = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cache.ttl_hours"));

        config.cache.ttl_hours = -3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let mut config = valid_config();
        config.statistics.probe_interval_secs = 0;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("statistics.probe_interval_secs"));

        let mut config = valid_config();
        config.cache.sweep_interval_secs = 0;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("cache.sweep_interval_secs"));
    }
}
