//! Live events pushed by the auction server and the client's own
//! connection-state events.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuctionId, BidderId, Timestamp};

/// New current price and bid count for one auction.
///
/// Relayed exactly as the server sent it; the client does not check that
/// prices or counts only move forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidUpdate {
    pub auction_id: AuctionId,
    pub current_price: f64,
    pub bid_count: u32,
    #[serde(default, alias = "highestBidder", skip_serializing_if = "Option::is_none")]
    pub highest_bidder_id: Option<BidderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest_bidder_name: Option<String>,
    #[serde(default, alias = "isYourBid")]
    pub is_own_bid: bool,
    #[serde(default = "Timestamp::now")]
    pub timestamp: Timestamp,
}

/// Lifecycle status of an auction as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    #[serde(alias = "active")]
    Live,
    EndingSoon,
    Ended,
    Cancelled,
}

impl AuctionStatus {
    /// Whether bids can still be placed.
    pub fn accepts_bids(&self) -> bool {
        matches!(self, AuctionStatus::Live | AuctionStatus::EndingSoon)
    }
}

/// Status change for one auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionStatusEvent {
    pub auction_id: AuctionId,
    pub status: AuctionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    #[serde(default, alias = "winner", skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<BidderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_price: Option<f64>,
}

/// A typed event republished by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Bid(BidUpdate),
    Status(AuctionStatusEvent),
}

impl LiveEvent {
    /// The auction this event belongs to.
    pub fn auction_id(&self) -> &AuctionId {
        match self {
            LiveEvent::Bid(update) => &update.auction_id,
            LiveEvent::Status(event) => &event.auction_id,
        }
    }

    /// Wire `type` discriminator of the frame this event came from.
    pub fn frame_type(&self) -> &'static str {
        match self {
            LiveEvent::Bid(_) => "bid_update",
            LiveEvent::Status(_) => "auction_update",
        }
    }
}

/// Client-side view of socket health, emitted on every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
    Error(String),
}
