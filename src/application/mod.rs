//! Application layer - wiring the live stack into screens.
//!
//! `LiveClient` is the root that owns the single connection; screens borrow
//! it to subscribe, react to events and place bids.

pub mod live_client;
pub mod screens;

pub use live_client::{LiveClient, LiveClientOptions};
pub use screens::{AuctionDetailScreen, BidError, NotificationBadge};
