//! Per-auction channel interest and the control frames that go with it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::domain::foundation::{AuctionId, ValidationError};

use super::connection::{ConnectionManager, SendOutcome};
use super::messages::ClientMessage;

/// Records which auctions the client wants live updates for and sends the
/// matching subscribe/unsubscribe frames.
///
/// Interest is counted, so two screens on the same auction do not cancel
/// each other: the unsubscribe frame goes out when the last one leaves.
/// Frames are only sent while connected; otherwise they are dropped and
/// not replayed unless `resend_all` is called.
pub struct SubscriptionTracker {
    connection: Arc<ConnectionManager>,
    interests: Mutex<HashMap<AuctionId, usize>>,
}

impl SubscriptionTracker {
    pub fn new(connection: Arc<ConnectionManager>) -> Self {
        Self {
            connection,
            interests: Mutex::new(HashMap::new()),
        }
    }

    /// Record interest in an auction and send `subscribe`.
    pub fn subscribe(&self, auction_id: &AuctionId) -> SendOutcome {
        let count = {
            let mut interests = self.interests();
            let count = interests.entry(auction_id.clone()).or_insert(0);
            *count += 1;
            *count
        };
        debug!(auction_id = %auction_id, interest = count, "subscribing to auction");
        self.connection
            .send(&ClientMessage::subscribe(auction_id.clone()))
    }

    /// Release one interest in an auction; sends `unsubscribe` when it was
    /// the last. Returns `None` when other interest remains.
    pub fn unsubscribe(&self, auction_id: &AuctionId) -> Option<SendOutcome> {
        {
            let mut interests = self.interests();
            if let Some(count) = interests.get_mut(auction_id) {
                *count -= 1;
                if *count > 0 {
                    debug!(auction_id = %auction_id, interest = *count, "auction still watched");
                    return None;
                }
                interests.remove(auction_id);
            }
        }
        debug!(auction_id = %auction_id, "unsubscribing from auction");
        Some(
            self.connection
                .send(&ClientMessage::unsubscribe(auction_id.clone())),
        )
    }

    /// Send `subscribe` again for every recorded interest. Returns how many
    /// frames were actually sent.
    pub fn resend_all(&self) -> usize {
        let ids = self.subscribed();
        let sent = ids
            .into_iter()
            .filter(|id| self.connection.send(&ClientMessage::subscribe(id.clone())) == SendOutcome::Sent)
            .count();
        info!(sent, "re-sent auction subscriptions");
        sent
    }

    /// Send a bid over the socket.
    pub fn place_bid(
        &self,
        auction_id: &AuctionId,
        amount: f64,
    ) -> Result<SendOutcome, ValidationError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::invalid_amount("amount", amount));
        }
        Ok(self
            .connection
            .send(&ClientMessage::bid(auction_id.clone(), amount)))
    }

    pub fn is_subscribed(&self, auction_id: &AuctionId) -> bool {
        self.interests().contains_key(auction_id)
    }

    /// Auctions with recorded interest, sorted.
    pub fn subscribed(&self) -> Vec<AuctionId> {
        let mut ids: Vec<AuctionId> = self.interests().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn interests(&self) -> MutexGuard<'_, HashMap<AuctionId, usize>> {
        self.interests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
