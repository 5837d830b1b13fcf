//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("WebSocket URL must start with ws:// or wss://")]
    InvalidWebSocketUrl,

    #[error("API base URL must start with http:// or https://")]
    InvalidApiUrl,

    #[error("Invalid reconnect delay")]
    InvalidReconnectDelay,

    #[error("Backoff cap is below the reconnect delay")]
    BackoffCapTooSmall,

    #[error("Max reconnect attempts requires a backoff cap")]
    MaxAttemptsWithoutBackoff,

    #[error("Invalid handshake timeout")]
    InvalidHandshakeTimeout,

    #[error("Read timeout must exceed a non-zero ping interval")]
    InvalidKeepalive,

    #[error("Event capacity must be greater than zero")]
    InvalidEventCapacity,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid notification poll interval")]
    InvalidPollInterval,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
