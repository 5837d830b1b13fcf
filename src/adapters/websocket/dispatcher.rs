//! Fan-out of inbound frames to typed event readers.
//!
//! Every decoded event goes onto one broadcast channel. Readers either take
//! the whole stream or an `AuctionFeed` that filters it down to one auction.
//!
//! ```text
//! socket ──text──▶ EventDispatcher ──LiveEvent──▶ broadcast
//!                                                ├── AuctionFeed("42") ── screen 42
//!                                                ├── AuctionFeed("7")  ── screen 7
//!                                                └── Receiver          ── logger
//! ```

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::foundation::AuctionId;
use crate::domain::live::LiveEvent;

use super::messages::decode_server_frame;

/// Default buffer per reader before it starts lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 128;

/// What `dispatch` did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Decoded and broadcast (possibly to zero readers).
    Published,
    /// Valid JSON with a missing or unknown `type`.
    Ignored,
    /// Unparseable; logged and dropped.
    Malformed,
}

/// Parses inbound frames and republishes them as `LiveEvent`s.
///
/// # Thread Safety
///
/// `dispatch` takes `&self`; the broadcast sender is internally synchronized,
/// so one dispatcher can be shared through an `Arc`.
#[derive(Debug)]
pub struct EventDispatcher {
    sender: broadcast::Sender<LiveEvent>,
}

impl EventDispatcher {
    /// Create a dispatcher whose readers buffer up to `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Create with default capacity (128 events).
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }

    /// Decode one frame and publish it. Never fails and never panics.
    pub fn dispatch(&self, text: &str) -> DispatchOutcome {
        match decode_server_frame(text) {
            Ok(Some(event)) => {
                debug!(
                    frame_type = event.frame_type(),
                    auction_id = %event.auction_id(),
                    "dispatching live event"
                );
                // No readers is fine.
                let _ = self.sender.send(event);
                DispatchOutcome::Published
            }
            Ok(None) => {
                debug!(len = text.len(), "ignoring frame without a known type");
                DispatchOutcome::Ignored
            }
            Err(e) => {
                warn!(error = %e, len = text.len(), "dropping malformed frame");
                DispatchOutcome::Malformed
            }
        }
    }

    /// A reader for every event, starting from now.
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.sender.subscribe()
    }

    /// A reader for one auction's events, starting from now.
    pub fn watch_auction(&self, auction_id: AuctionId) -> AuctionFeed {
        AuctionFeed {
            auction_id,
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Events for a single auction.
#[derive(Debug)]
pub struct AuctionFeed {
    auction_id: AuctionId,
    receiver: broadcast::Receiver<LiveEvent>,
}

impl AuctionFeed {
    pub fn auction_id(&self) -> &AuctionId {
        &self.auction_id
    }

    /// Next event for this auction; `None` once the dispatcher is gone.
    ///
    /// A reader that falls behind skips what it missed and carries on.
    pub async fn next(&mut self) -> Option<LiveEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.auction_id() == &self.auction_id => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(auction_id = %self.auction_id, skipped, "auction feed lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    const BID_42: &str =
        r#"{"type":"bid_update","auctionId":"42","currentPrice":150.0,"bidCount":3}"#;
    const BID_7: &str = r#"{"type":"bid_update","auctionId":"7","currentPrice":9.0,"bidCount":1}"#;

    fn id(s: &str) -> AuctionId {
        AuctionId::new(s).unwrap()
    }

    #[test]
    fn dispatch_reports_outcomes() {
        let dispatcher = EventDispatcher::with_default_capacity();
        assert_eq!(dispatcher.dispatch(BID_42), DispatchOutcome::Published);
        assert_eq!(dispatcher.dispatch(r#"{"type":"typing"}"#), DispatchOutcome::Ignored);
        assert_eq!(dispatcher.dispatch("{oops"), DispatchOutcome::Malformed);
        assert_eq!(dispatcher.dispatch(""), DispatchOutcome::Malformed);
    }

    #[tokio::test]
    async fn subscribers_each_receive_every_event() {
        let dispatcher = EventDispatcher::with_default_capacity();
        let mut a = dispatcher.subscribe();
        let mut b = dispatcher.subscribe();

        dispatcher.dispatch(BID_42);

        assert_eq!(a.recv().await.unwrap().auction_id(), &id("42"));
        assert_eq!(b.recv().await.unwrap().auction_id(), &id("42"));
    }

    #[tokio::test]
    async fn auction_feed_filters_by_id() {
        let dispatcher = EventDispatcher::with_default_capacity();
        let mut feed_42 = dispatcher.watch_auction(id("42"));
        let mut feed_7 = dispatcher.watch_auction(id("7"));

        dispatcher.dispatch(BID_7);
        dispatcher.dispatch(BID_42);

        let event = feed_42.next().await.unwrap();
        assert_eq!(event.auction_id(), &id("42"));
        assert_eq!(feed_7.next().await.unwrap().auction_id(), &id("7"));

        let nothing = timeout(Duration::from_millis(20), feed_7.next()).await;
        assert!(nothing.is_err(), "feed 7 must not see auction 42");
    }

    #[tokio::test]
    async fn lagging_feed_skips_and_continues() {
        let dispatcher = EventDispatcher::new(2);
        let mut feed = dispatcher.watch_auction(id("42"));

        for count in 1..=5 {
            dispatcher.dispatch(&format!(
                r#"{{"type":"bid_update","auctionId":"42","currentPrice":{count}.0,"bidCount":{count}}}"#
            ));
        }

        match feed.next().await.unwrap() {
            LiveEvent::Bid(update) => assert_eq!(update.bid_count, 4),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn feed_ends_when_dispatcher_dropped() {
        let dispatcher = EventDispatcher::with_default_capacity();
        let mut feed = dispatcher.watch_auction(id("42"));
        drop(dispatcher);
        assert!(feed.next().await.is_none());
    }
}
