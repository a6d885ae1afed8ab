//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default simulated network latency for login and verification calls.
pub const DEFAULT_NETWORK_DELAY_MS: u64 = 1000;
/// Default interval between duration ticks while tracking.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;
/// Default window within which a persisted session is restored.
pub const DEFAULT_RESTORE_WINDOW_SECS: u64 = 60 * 60;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// JSON file backing the key/value store. In-memory store when `None`.
    pub data_file: Option<PathBuf>,
    /// Simulated latency applied to login and verify
    pub network_delay: Duration,
    /// Duration tick interval
    pub tick_interval: Duration,
    /// Recency window for restoring a persisted session
    pub restore_window: Duration,
}

impl Config {
    /// Config for tests: in-memory storage and no artificial latency.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            data_file: None,
            network_delay: Duration::ZERO,
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            restore_window: Duration::from_secs(DEFAULT_RESTORE_WINDOW_SECS),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_var("PORT", 8080)?,
            data_file: env::var("DATA_FILE")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            network_delay: Duration::from_millis(parse_var(
                "NETWORK_DELAY_MS",
                DEFAULT_NETWORK_DELAY_MS,
            )?),
            tick_interval: Duration::from_millis(parse_var(
                "TICK_INTERVAL_MS",
                DEFAULT_TICK_INTERVAL_MS,
            )?),
            restore_window: Duration::from_secs(parse_var(
                "RESTORE_WINDOW_SECS",
                DEFAULT_RESTORE_WINDOW_SECS,
            )?),
        })
    }
}

/// Read a numeric variable, falling back to `default` when unset.
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("PORT", "9090");
        env::set_var("NETWORK_DELAY_MS", "250");
        env::set_var("DATA_FILE", "/tmp/calorimetrics.json");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 9090);
        assert_eq!(config.network_delay, Duration::from_millis(250));
        assert_eq!(
            config.data_file,
            Some(PathBuf::from("/tmp/calorimetrics.json"))
        );
        assert_eq!(config.restore_window, Duration::from_secs(3600));

        env::set_var("TICK_INTERVAL_MS", "soon");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("TICK_INTERVAL_MS"))
        ));

        env::remove_var("PORT");
        env::remove_var("NETWORK_DELAY_MS");
        env::remove_var("DATA_FILE");
        env::remove_var("TICK_INTERVAL_MS");
    }
}
