//! HTTP Auction API - Implementation of AuctionApi over the marketplace REST API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpApiConfig::new("https://zubid-2025.onrender.com")
//!     .with_auth_token(token)
//!     .with_timeout(Duration::from_secs(30));
//!
//! let api = HttpAuctionApi::new(config)?;
//! ```
//!
//! GET requests are retried with exponential backoff on transient failures;
//! bids are never retried.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::auction::{AuctionSnapshot, Notification};
use crate::domain::foundation::AuctionId;
use crate::ports::{ApiError, AuctionApi, BidReceipt};

/// Configuration for the REST client.
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    /// Scheme and host, without a trailing `/api`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries for GET requests on transient failures.
    pub max_retries: u32,
    auth_token: Option<SecretString>,
}

impl HttpApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            auth_token: None,
        }
    }

    /// Sets the bearer token.
    pub fn with_auth_token(mut self, token: Option<SecretString>) -> Self {
        self.auth_token = token;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// REST client for auction snapshots, bids and notifications.
pub struct HttpAuctionApi {
    config: HttpApiConfig,
    client: Client,
}

impl HttpAuctionApi {
    pub fn new(config: HttpApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.config.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout {
                timeout_secs: self.config.timeout.as_secs(),
            }
        } else if e.is_connect() {
            ApiError::network(format!("Connection failed: {}", e))
        } else {
            ApiError::network(e.to_string())
        }
    }

    /// Turns non-2xx responses into errors, preferring the server's `error` text.
    async fn check_status(response: Response, path: &str) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(ApiError::Unauthorized),
            404 => Err(ApiError::NotFound(path.to_string())),
            code => Err(ApiError::rejected(code, error_message(&body))),
        }
    }

    async fn get_once<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .authorize(self.client.get(self.url(path)))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response, path).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::parse(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let mut retry_count = 0;
        loop {
            match self.get_once(path).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry_count < self.config.max_retries => {
                    // Exponential backoff: 1s, 2s, 4s, ...
                    let delay = Duration::from_secs(1 << retry_count);
                    warn!(path, error = %err, delay_ms = delay.as_millis() as u64, "retrying request");
                    sleep(delay).await;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Server `error` field if the body is JSON, else the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// The notification list comes either bare or wrapped in `{"notifications": [...]}`.
fn parse_notifications(body: Value) -> Result<Vec<Notification>, ApiError> {
    let list = match body {
        Value::Array(_) => body,
        Value::Object(mut map) => map
            .remove("notifications")
            .ok_or_else(|| ApiError::parse("missing 'notifications' field"))?,
        _ => return Err(ApiError::parse("expected a notification list")),
    };
    serde_json::from_value(list).map_err(|e| ApiError::parse(e.to_string()))
}

#[async_trait]
impl AuctionApi for HttpAuctionApi {
    async fn get_auction(&self, auction_id: &AuctionId) -> Result<AuctionSnapshot, ApiError> {
        self.get(&format!("auctions/{}", auction_id)).await
    }

    async fn place_bid(&self, auction_id: &AuctionId, amount: f64) -> Result<BidReceipt, ApiError> {
        let path = format!("auctions/{}/bids", auction_id);
        debug!(auction_id = %auction_id, amount, "placing bid");
        let response = self
            .authorize(self.client.post(self.url(&path)))
            .json(&serde_json::json!({ "amount": amount }))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response, &path).await?;
        response
            .json::<BidReceipt>()
            .await
            .map_err(|e| ApiError::parse(e.to_string()))
    }

    async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let body: Value = self.get("notifications").await?;
        parse_notifications(body)
    }
}
