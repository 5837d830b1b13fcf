//! Auction API Port - REST collaborator the screens read from.
//!
//! Covers the three routes the live screens need: the auction snapshot a
//! detail screen opens with, placing a bid, and the notification list behind
//! the badge.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::auction::{AuctionSnapshot, Notification};
use crate::domain::foundation::AuctionId;

/// Port for the marketplace REST API.
#[async_trait]
pub trait AuctionApi: Send + Sync {
    /// `GET /api/auctions/{id}`
    async fn get_auction(&self, auction_id: &AuctionId) -> Result<AuctionSnapshot, ApiError>;

    /// `POST /api/auctions/{id}/bids`
    async fn place_bid(&self, auction_id: &AuctionId, amount: f64) -> Result<BidReceipt, ApiError>;

    /// `GET /api/notifications`
    async fn notifications(&self) -> Result<Vec<Notification>, ApiError>;
}

/// Server's answer to a bid.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BidReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub current_bid: Option<f64>,
    #[serde(default)]
    pub bid_id: Option<u64>,
    #[serde(default)]
    pub time_extended: Option<bool>,
    #[serde(default)]
    pub time_left: Option<i64>,
}

impl BidReceipt {
    /// The server accepted the bid.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.message.is_some()
    }
}

/// REST failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Missing or rejected credentials.
    #[error("authentication required")]
    Unauthorized,

    /// The resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server refused the request and said why.
    #[error("rejected ({status}): {message}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Server-provided `error` text, or the raw body.
        message: String,
    },

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// No response within the configured timeout.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// Response body did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Creates a rejected error.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout { .. })
            || matches!(self, ApiError::Rejected { status, .. } if *status >= 500)
    }
}
