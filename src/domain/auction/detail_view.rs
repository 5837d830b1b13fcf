//! View model behind the auction detail screen.
//!
//! Pure state: the screen binding feeds it live events and publishes the
//! result; nothing here touches the network or a clock except through the
//! `now` arguments.

use uuid::Uuid;

use crate::domain::foundation::{format_price, AuctionId, BidderId, Timestamp, ValidationError};
use crate::domain::live::{
    AuctionStatus, AuctionStatusEvent, BidUpdate, ConnectionEvent, LinkState, LiveEvent,
};

use super::snapshot::AuctionSnapshot;

/// Label shown for a bidder the server did not name.
pub const UNKNOWN_BIDDER: &str = "Unknown";

/// Rows kept in the bid history; older ones fall off the end.
pub const MAX_BID_HISTORY: usize = 50;

/// One row of the bid history list, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct BidHistoryRow {
    /// Client-generated; live frames carry no bid id.
    pub id: Uuid,
    pub bidder_id: Option<BidderId>,
    pub bidder_name: String,
    pub amount: f64,
    pub timestamp: Timestamp,
    pub is_winning: bool,
}

/// Connection indicator on the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionBadge {
    Live,
    #[default]
    Offline,
    Reconnecting,
}

impl ConnectionBadge {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionBadge::Live => "live",
            ConnectionBadge::Offline => "offline",
            ConnectionBadge::Reconnecting => "reconnecting",
        }
    }
}

impl From<&ConnectionEvent> for ConnectionBadge {
    fn from(event: &ConnectionEvent) -> Self {
        match event {
            ConnectionEvent::Connected => ConnectionBadge::Live,
            ConnectionEvent::Disconnected => ConnectionBadge::Offline,
            ConnectionEvent::Error(_) => ConnectionBadge::Reconnecting,
        }
    }
}

impl From<LinkState> for ConnectionBadge {
    fn from(state: LinkState) -> Self {
        match state {
            LinkState::Connected => ConnectionBadge::Live,
            LinkState::Reconnecting => ConnectionBadge::Reconnecting,
            LinkState::Connecting | LinkState::Disconnected => ConnectionBadge::Offline,
        }
    }
}

/// One-shot side effect raised by an event, for toasts or notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenEffect {
    /// Someone else now holds the highest bid.
    Outbid {
        auction_id: AuctionId,
        title: String,
        current_price: f64,
    },
    AuctionEnded {
        auction_id: AuctionId,
        winner_id: Option<BidderId>,
        final_price: Option<f64>,
    },
    EndingSoon { auction_id: AuctionId },
}

impl ScreenEffect {
    pub fn auction_id(&self) -> &AuctionId {
        match self {
            ScreenEffect::Outbid { auction_id, .. }
            | ScreenEffect::AuctionEnded { auction_id, .. }
            | ScreenEffect::EndingSoon { auction_id } => auction_id,
        }
    }

    /// Short human-readable text for a toast.
    pub fn message(&self) -> String {
        match self {
            ScreenEffect::Outbid {
                title,
                current_price,
                ..
            } if !title.is_empty() => {
                format!("You've been outbid on {title}: now {}", format_price(*current_price))
            }
            ScreenEffect::Outbid { current_price, .. } => {
                format!("You've been outbid: now {}", format_price(*current_price))
            }
            ScreenEffect::AuctionEnded { .. } => "Auction has ended".to_string(),
            ScreenEffect::EndingSoon { .. } => "Auction ending soon!".to_string(),
        }
    }
}

/// Everything the detail screen renders for one auction.
#[derive(Debug, Clone, PartialEq)]
pub struct AuctionDetailView {
    pub auction_id: AuctionId,
    pub title: String,
    pub current_price: f64,
    pub bid_count: u32,
    pub bid_increment: f64,
    pub end_time: Option<Timestamp>,
    pub status: AuctionStatus,
    pub winner_id: Option<BidderId>,
    pub final_price: Option<f64>,
    pub bid_history: Vec<BidHistoryRow>,
    pub bidding_open: bool,
    /// "New bid placed" banner; cleared by the screen after a few seconds.
    pub live_indicator: bool,
    pub connection: ConnectionBadge,
}

impl AuctionDetailView {
    pub fn from_snapshot(snapshot: AuctionSnapshot) -> Self {
        let status = snapshot.status.unwrap_or(AuctionStatus::Live);
        Self {
            auction_id: snapshot.id,
            title: snapshot.title,
            current_price: snapshot.current_price,
            bid_count: snapshot.bid_count,
            bid_increment: snapshot.bid_increment,
            end_time: snapshot.end_time,
            status,
            winner_id: snapshot.winner_id,
            final_price: None,
            bid_history: Vec::new(),
            bidding_open: status.accepts_bids(),
            live_indicator: false,
            connection: ConnectionBadge::default(),
        }
    }

    /// Applies a live event. Events for other auctions leave the view untouched.
    pub fn apply(&mut self, event: &LiveEvent, viewer_logged_in: bool) -> Option<ScreenEffect> {
        if event.auction_id() != &self.auction_id {
            return None;
        }
        match event {
            LiveEvent::Bid(update) => self.apply_bid(update, viewer_logged_in),
            LiveEvent::Status(status) => self.apply_status(status),
        }
    }

    fn apply_bid(&mut self, update: &BidUpdate, viewer_logged_in: bool) -> Option<ScreenEffect> {
        self.current_price = update.current_price;
        self.bid_count = update.bid_count;

        for row in &mut self.bid_history {
            row.is_winning = false;
        }
        self.bid_history.insert(
            0,
            BidHistoryRow {
                id: Uuid::new_v4(),
                bidder_id: update.highest_bidder_id.clone(),
                bidder_name: update
                    .highest_bidder_name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_BIDDER.to_string()),
                amount: update.current_price,
                timestamp: update.timestamp,
                is_winning: true,
            },
        );
        self.bid_history.truncate(MAX_BID_HISTORY);

        if update.is_own_bid || !viewer_logged_in {
            return None;
        }
        self.live_indicator = true;
        Some(ScreenEffect::Outbid {
            auction_id: self.auction_id.clone(),
            title: self.title.clone(),
            current_price: update.current_price,
        })
    }

    fn apply_status(&mut self, event: &AuctionStatusEvent) -> Option<ScreenEffect> {
        self.status = event.status;
        if let Some(end_time) = event.end_time {
            self.end_time = Some(end_time);
        }
        if event.winner_id.is_some() {
            self.winner_id = event.winner_id.clone();
        }
        if event.final_price.is_some() {
            self.final_price = event.final_price;
        }
        self.bidding_open = event.status.accepts_bids();

        match event.status {
            AuctionStatus::Ended => Some(ScreenEffect::AuctionEnded {
                auction_id: self.auction_id.clone(),
                winner_id: self.winner_id.clone(),
                final_price: self.final_price,
            }),
            AuctionStatus::EndingSoon => Some(ScreenEffect::EndingSoon {
                auction_id: self.auction_id.clone(),
            }),
            AuctionStatus::Live | AuctionStatus::Cancelled => None,
        }
    }

    pub fn apply_connection(&mut self, event: &ConnectionEvent) {
        self.connection = ConnectionBadge::from(event);
    }

    /// Records a bid accepted over REST; the server's price wins when given.
    pub fn record_accepted_bid(&mut self, amount: f64, server_price: Option<f64>) {
        self.current_price = server_price.unwrap_or(amount);
        self.bid_count = self.bid_count.saturating_add(1);
    }

    /// Lowest amount the server will accept as the next bid.
    pub fn minimum_bid(&self) -> f64 {
        self.current_price + self.bid_increment
    }

    /// Checks a bid before it is sent.
    pub fn validate_bid(&self, amount: f64) -> Result<f64, ValidationError> {
        if !self.bidding_open {
            return Err(ValidationError::invalid_format(
                "auction_status",
                format!("auction is {}", status_label(self.status)),
            ));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::invalid_amount("amount", amount));
        }
        let minimum = self.minimum_bid();
        if amount < minimum {
            return Err(ValidationError::bid_too_low(minimum, amount));
        }
        Ok(amount)
    }

    pub fn price_label(&self) -> String {
        format_price(self.current_price)
    }

    pub fn bid_count_label(&self) -> String {
        format!("{} bids", self.bid_count)
    }

    pub fn time_remaining_label(&self, now: Timestamp) -> String {
        match self.end_time {
            Some(end_time) => format_time_remaining(end_time, now),
            None => "Ended".to_string(),
        }
    }
}

fn status_label(status: AuctionStatus) -> &'static str {
    match status {
        AuctionStatus::Live => "live",
        AuctionStatus::EndingSoon => "ending soon",
        AuctionStatus::Ended => "ended",
        AuctionStatus::Cancelled => "cancelled",
    }
}

/// `02h 05m 09s` until `end_time`, or `Ended` once it has passed.
pub fn format_time_remaining(end_time: Timestamp, now: Timestamp) -> String {
    let remaining = end_time.duration_since(&now);
    if remaining.num_milliseconds() <= 0 {
        return "Ended".to_string();
    }
    let total = remaining.num_seconds();
    let hours = total / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("{hours:02}h {minutes:02}m {seconds:02}s")
}
