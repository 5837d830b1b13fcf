//! Mock Auction API for testing.
//!
//! Serves canned snapshots and notification lists, queues bid outcomes and
//! records every bid it was asked to place.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::domain::auction::{AuctionSnapshot, Notification};
use crate::domain::foundation::AuctionId;
use crate::ports::{ApiError, AuctionApi, BidReceipt};

/// Mock auction API for testing.
#[derive(Debug, Clone)]
pub struct MockAuctionApi {
    auctions: Arc<Mutex<HashMap<AuctionId, AuctionSnapshot>>>,
    notifications: Arc<Mutex<Result<Vec<Notification>, ApiError>>>,
    bid_results: Arc<Mutex<VecDeque<Result<BidReceipt, ApiError>>>>,
    bids: Arc<Mutex<Vec<(AuctionId, f64)>>>,
    notification_calls: Arc<Mutex<usize>>,
}

impl Default for MockAuctionApi {
    fn default() -> Self {
        Self {
            auctions: Arc::default(),
            notifications: Arc::new(Mutex::new(Ok(Vec::new()))),
            bid_results: Arc::default(),
            bids: Arc::default(),
            notification_calls: Arc::default(),
        }
    }
}

impl MockAuctionApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `snapshot` for its auction id.
    pub fn with_auction(self, snapshot: AuctionSnapshot) -> Self {
        self.auctions
            .lock()
            .unwrap()
            .insert(snapshot.id.clone(), snapshot);
        self
    }

    /// Replace the notification list.
    pub fn set_notifications(&self, list: Vec<Notification>) {
        *self.notifications.lock().unwrap() = Ok(list);
    }

    /// Make notification polls fail.
    pub fn fail_notifications(&self, error: ApiError) {
        *self.notifications.lock().unwrap() = Err(error);
    }

    /// Queue the outcome of the next bid. Without one, bids succeed.
    pub fn push_bid_result(&self, result: Result<BidReceipt, ApiError>) {
        self.bid_results.lock().unwrap().push_back(result);
    }

    /// Bids placed so far.
    pub fn bids(&self) -> Vec<(AuctionId, f64)> {
        self.bids.lock().unwrap().clone()
    }

    /// Number of notification polls.
    pub fn notification_calls(&self) -> usize {
        *self.notification_calls.lock().unwrap()
    }
}

#[async_trait]
impl AuctionApi for MockAuctionApi {
    async fn get_auction(&self, auction_id: &AuctionId) -> Result<AuctionSnapshot, ApiError> {
        self.auctions
            .lock()
            .unwrap()
            .get(auction_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("auctions/{}", auction_id)))
    }

    async fn place_bid(&self, auction_id: &AuctionId, amount: f64) -> Result<BidReceipt, ApiError> {
        self.bids.lock().unwrap().push((auction_id.clone(), amount));
        self.bid_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(BidReceipt {
                    message: Some("Bid placed successfully".to_string()),
                    current_bid: Some(amount),
                    ..BidReceipt::default()
                })
            })
    }

    async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        *self.notification_calls.lock().unwrap() += 1;
        self.notifications.lock().unwrap().clone()
    }
}
