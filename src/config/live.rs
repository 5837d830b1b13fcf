//! Live socket configuration

use serde::Deserialize;
use std::time::Duration;

use crate::adapters::websocket::ConnectionSettings;
use crate::domain::live::ReconnectPolicy;

use super::error::ValidationError;

/// WebSocket endpoint, reconnect schedule and event fan-out
#[derive(Debug, Clone, Deserialize)]
pub struct LiveConfig {
    /// `ws://` or `wss://` endpoint
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Delay before a reconnect, in milliseconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,

    /// Cap for exponential backoff; unset keeps the fixed delay
    pub backoff_max_delay_ms: Option<u64>,

    /// Consecutive failures after which backoff gives up; unset retries forever.
    /// Only valid together with `backoff_max_delay_ms`.
    pub max_reconnect_attempts: Option<u32>,

    /// Re-send every subscription after each reconnect
    #[serde(default)]
    pub resubscribe_on_reconnect: bool,

    /// Handshake timeout in seconds
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,

    /// Seconds between keepalive pings
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,

    /// Seconds of silence before the socket is dropped and reconnected
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Events buffered per dispatcher reader before it lags
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl LiveConfig {
    /// Reconnect schedule described by this section.
    ///
    /// Exponential backoff is used only when a cap is configured.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let base = Duration::from_millis(self.reconnect_delay_ms);
        match self.backoff_max_delay_ms {
            Some(max) => ReconnectPolicy::Exponential {
                base,
                max: Duration::from_millis(max),
                max_attempts: self.max_reconnect_attempts,
            },
            None => ReconnectPolicy::Fixed(base),
        }
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings::new(self.ws_url.clone())
            .with_reconnect(self.reconnect_policy())
            .with_keepalive(
                Duration::from_secs(self.ping_interval_secs),
                Duration::from_secs(self.read_timeout_secs),
            )
    }

    /// Get handshake timeout as Duration
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// Validate live configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.ws_url.starts_with("ws://") || self.ws_url.starts_with("wss://")) {
            return Err(ValidationError::InvalidWebSocketUrl);
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ValidationError::InvalidReconnectDelay);
        }
        match self.backoff_max_delay_ms {
            Some(max) if max < self.reconnect_delay_ms => {
                return Err(ValidationError::BackoffCapTooSmall);
            }
            None if self.max_reconnect_attempts.is_some() => {
                return Err(ValidationError::MaxAttemptsWithoutBackoff);
            }
            _ => {}
        }
        if self.handshake_timeout_secs == 0 || self.handshake_timeout_secs > 120 {
            return Err(ValidationError::InvalidHandshakeTimeout);
        }
        if self.ping_interval_secs == 0 || self.read_timeout_secs <= self.ping_interval_secs {
            return Err(ValidationError::InvalidKeepalive);
        }
        if self.event_capacity == 0 {
            return Err(ValidationError::InvalidEventCapacity);
        }
        Ok(())
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            reconnect_delay_ms: default_reconnect_delay(),
            backoff_max_delay_ms: None,
            max_reconnect_attempts: None,
            resubscribe_on_reconnect: false,
            handshake_timeout_secs: default_handshake_timeout(),
            ping_interval_secs: default_ping_interval(),
            read_timeout_secs: default_read_timeout(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_ws_url() -> String {
    "wss://zubid-2025.onrender.com/ws".to_string()
}

fn default_reconnect_delay() -> u64 {
    5_000
}

fn default_handshake_timeout() -> u64 {
    10
}

fn default_ping_interval() -> u64 {
    20
}

fn default_read_timeout() -> u64 {
    30
}

fn default_event_capacity() -> usize {
    128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_give_fixed_five_second_policy() {
        let config = LiveConfig::default();
        assert_eq!(config.reconnect_policy(), ReconnectPolicy::default());
        assert!(!config.resubscribe_on_reconnect);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn backoff_cap_switches_to_exponential() {
        let config = LiveConfig {
            backoff_max_delay_ms: Some(60_000),
            max_reconnect_attempts: Some(8),
            ..Default::default()
        };
        assert_eq!(
            config.reconnect_policy(),
            ReconnectPolicy::Exponential {
                base: Duration::from_secs(5),
                max: Duration::from_secs(60),
                max_attempts: Some(8),
            }
        );
    }

    #[test]
    fn connection_settings_carry_url_and_policy() {
        let config = LiveConfig {
            ws_url: "ws://localhost:5000/ws".to_string(),
            ..Default::default()
        };
        let settings = config.connection_settings();
        assert_eq!(settings.url, "ws://localhost:5000/ws");
        assert_eq!(settings.reconnect, ReconnectPolicy::default());
        assert_eq!(settings.ping_interval, Duration::from_secs(20));
        assert_eq!(settings.idle_timeout, Duration::from_secs(30));
    }

    #[test]
    fn keepalive_values_reach_settings() {
        let config = LiveConfig {
            ping_interval_secs: 5,
            read_timeout_secs: 12,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        let settings = config.connection_settings();
        assert_eq!(settings.ping_interval, Duration::from_secs(5));
        assert_eq!(settings.idle_timeout, Duration::from_secs(12));
    }

    #[test]
    fn rejects_read_timeout_not_above_ping_interval() {
        let equal = LiveConfig {
            ping_interval_secs: 30,
            read_timeout_secs: 30,
            ..Default::default()
        };
        assert_eq!(equal.validate(), Err(ValidationError::InvalidKeepalive));

        let no_pings = LiveConfig {
            ping_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(no_pings.validate(), Err(ValidationError::InvalidKeepalive));
    }

    #[test]
    fn rejects_max_attempts_without_backoff_cap() {
        let config = LiveConfig {
            max_reconnect_attempts: Some(3),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MaxAttemptsWithoutBackoff)
        );
    }

    #[test]
    fn rejects_http_url() {
        let config = LiveConfig {
            ws_url: "https://zubid-2025.onrender.com/ws".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidWebSocketUrl));
    }

    #[test]
    fn rejects_cap_below_delay() {
        let config = LiveConfig {
            backoff_max_delay_ms: Some(1_000),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::BackoffCapTooSmall));
    }

    #[test]
    fn rejects_zero_values() {
        let zero_delay = LiveConfig {
            reconnect_delay_ms: 0,
            ..Default::default()
        };
        assert_eq!(zero_delay.validate(), Err(ValidationError::InvalidReconnectDelay));

        let zero_capacity = LiveConfig {
            event_capacity: 0,
            ..Default::default()
        };
        assert_eq!(zero_capacity.validate(), Err(ValidationError::InvalidEventCapacity));
    }
}
