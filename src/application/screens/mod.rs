//! Screen bindings - live state for the parts of the UI that react to the socket.
//!
//! Each binding owns a background task and publishes its state through a
//! `tokio::sync::watch` channel; dropping the binding stops the task.

mod auction_detail;
mod notification_badge;

pub use auction_detail::{AuctionDetailScreen, BidError, LIVE_INDICATOR_DURATION};
pub use notification_badge::{NotificationBadge, DEFAULT_POLL_INTERVAL};
