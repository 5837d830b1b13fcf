//! Auction screens' state: REST snapshot, detail view model, notifications.

mod detail_view;
mod notification;
mod snapshot;

pub use detail_view::{
    format_time_remaining, AuctionDetailView, BidHistoryRow, ConnectionBadge, ScreenEffect,
    MAX_BID_HISTORY, UNKNOWN_BIDDER,
};
pub use notification::{badge_label, time_ago, Notification, BADGE_MAX};
pub use snapshot::{AuctionSnapshot, DEFAULT_BID_INCREMENT};
