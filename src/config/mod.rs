//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `ZUBID` prefix and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use zubid_live::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Live endpoint: {}", config.live.ws_url);
//! ```

mod api;
mod error;
mod live;
mod logging;
mod notifications;

pub use api::ApiConfig;
pub use error::{ConfigError, ValidationError};
pub use live::LiveConfig;
pub use logging::LoggingConfig;
pub use notifications::NotificationConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a client
/// pointed at the production marketplace.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// WebSocket endpoint and reconnect behaviour
    #[serde(default)]
    pub live: LiveConfig,

    /// REST API (snapshots, bids, notifications)
    #[serde(default)]
    pub api: ApiConfig,

    /// Notification badge polling
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ZUBID` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `ZUBID__LIVE__WS_URL=ws://localhost:5000/ws` -> `live.ws_url`
    /// - `ZUBID__API__AUTH_TOKEN=...` -> `api.auth_token`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().prefix("ZUBID").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.live.validate()?;
        self.api.validate()?;
        self.notifications.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::live::ReconnectPolicy;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;
    use std::time::Duration;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const KEYS: &[&str] = &[
        "ZUBID__LIVE__WS_URL",
        "ZUBID__LIVE__RECONNECT_DELAY_MS",
        "ZUBID__LIVE__BACKOFF_MAX_DELAY_MS",
        "ZUBID__LIVE__RESUBSCRIBE_ON_RECONNECT",
        "ZUBID__LIVE__PING_INTERVAL_SECS",
        "ZUBID__LIVE__READ_TIMEOUT_SECS",
        "ZUBID__API__BASE_URL",
        "ZUBID__API__AUTH_TOKEN",
        "ZUBID__NOTIFICATIONS__POLL_INTERVAL_SECS",
        "ZUBID__LOGGING__JSON",
    ];

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_load_defaults_from_empty_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.live.ws_url, "wss://zubid-2025.onrender.com/ws");
        assert_eq!(config.live.reconnect_policy(), ReconnectPolicy::default());
        assert_eq!(config.notifications.poll_interval(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ZUBID__LIVE__WS_URL", "ws://localhost:5000/ws");
        env::set_var("ZUBID__LIVE__RECONNECT_DELAY_MS", "1000");
        env::set_var("ZUBID__LIVE__BACKOFF_MAX_DELAY_MS", "30000");
        env::set_var("ZUBID__LIVE__RESUBSCRIBE_ON_RECONNECT", "true");
        env::set_var("ZUBID__LIVE__PING_INTERVAL_SECS", "15");
        env::set_var("ZUBID__LIVE__READ_TIMEOUT_SECS", "45");
        env::set_var("ZUBID__API__BASE_URL", "http://localhost:5000");
        env::set_var("ZUBID__API__AUTH_TOKEN", "token-123");
        env::set_var("ZUBID__NOTIFICATIONS__POLL_INTERVAL_SECS", "10");
        env::set_var("ZUBID__LOGGING__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.live.ws_url, "ws://localhost:5000/ws");
        assert!(config.live.resubscribe_on_reconnect);
        assert_eq!(config.live.ping_interval_secs, 15);
        assert_eq!(config.live.read_timeout_secs, 45);
        assert!(matches!(
            config.live.reconnect_policy(),
            ReconnectPolicy::Exponential { .. }
        ));
        assert_eq!(config.api.base_url, "http://localhost:5000");
        assert_eq!(
            config.api.auth_token.as_ref().map(|t| t.expose_secret().as_str()),
            Some("token-123")
        );
        assert_eq!(config.notifications.poll_interval_secs, 10);
        assert!(config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_socket_url() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ZUBID__LIVE__WS_URL", "http://localhost:5000/ws");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.validate(), Err(ValidationError::InvalidWebSocketUrl));
    }

    #[test]
    fn test_unparseable_number_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ZUBID__LIVE__RECONNECT_DELAY_MS", "soon");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
