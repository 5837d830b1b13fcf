//! REST API configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use crate::adapters::rest::HttpApiConfig;

use super::error::ValidationError;

/// Marketplace REST API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Scheme and host; `/api` is appended per request
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries for idempotent requests
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Bearer token for REST and the socket handshake
    pub auth_token: Option<SecretString>,
}

impl ApiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn http_config(&self) -> HttpApiConfig {
        HttpApiConfig::new(self.base_url.clone())
            .with_timeout(self.timeout())
            .with_max_retries(self.max_retries)
            .with_auth_token(self.auth_token.clone())
    }

    /// Validate API configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ValidationError::InvalidApiUrl);
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            auth_token: None,
        }
    }
}

fn default_base_url() -> String {
    "https://zubid-2025.onrender.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}
