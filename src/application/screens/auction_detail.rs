//! AuctionDetailScreen - live binding for one auction's detail page.
//!
//! Opening the screen connects the client if needed, subscribes to the
//! auction channel and spawns a binding task that applies live events to a
//! `watch` view. The embedding UI renders whatever the watch holds.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::adapters::websocket::{AuctionFeed, SendOutcome};
use crate::application::LiveClient;
use crate::domain::auction::{AuctionDetailView, AuctionSnapshot, ConnectionBadge, ScreenEffect};
use crate::domain::foundation::{AuctionId, ValidationError};
use crate::domain::live::ConnectionEvent;
use crate::ports::{ApiError, BidReceipt};

/// How long the "new bid" indicator stays up.
pub const LIVE_INDICATOR_DURATION: Duration = Duration::from_secs(3);

/// Why a bid from the detail screen did not go through.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BidError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The server answered 2xx but reported an error.
    #[error("bid rejected: {0}")]
    Rejected(String),
}

/// Live detail screen for a single auction.
pub struct AuctionDetailScreen {
    client: Arc<LiveClient>,
    auction_id: AuctionId,
    view: Arc<watch::Sender<AuctionDetailView>>,
    binding: JoinHandle<()>,
    released: bool,
}

impl AuctionDetailScreen {
    /// Fetches the auction over REST, then opens the screen.
    pub async fn load(client: &Arc<LiveClient>, auction_id: &AuctionId) -> Result<Self, ApiError> {
        let snapshot = client.api().get_auction(auction_id).await?;
        Ok(Self::open(client, snapshot).await)
    }

    /// Opens the screen on an already fetched snapshot.
    ///
    /// The subscribe frame goes out once the handshake has settled; if the
    /// socket could not be opened it is dropped like any other frame.
    pub async fn open(client: &Arc<LiveClient>, snapshot: AuctionSnapshot) -> Self {
        let auction_id = snapshot.id.clone();
        let feed = client.dispatcher().watch_auction(auction_id.clone());
        let connection_events = client.connection().subscribe_events();

        let state = client.connect_and_wait().await;
        if client.subscriptions().subscribe(&auction_id) == SendOutcome::Dropped {
            warn!(auction_id = %auction_id, state = %state, "opened screen without live updates");
        }

        let mut initial = AuctionDetailView::from_snapshot(snapshot);
        initial.connection = ConnectionBadge::from(client.state());
        let (view, _) = watch::channel(initial);
        let view = Arc::new(view);

        let binding = tokio::spawn(bind(
            feed,
            connection_events,
            Arc::clone(&view),
            client.effect_sender(),
            client.viewer_logged_in(),
        ));

        info!(auction_id = %auction_id, "auction screen opened");
        Self {
            client: Arc::clone(client),
            auction_id,
            view,
            binding,
            released: false,
        }
    }

    pub fn auction_id(&self) -> &AuctionId {
        &self.auction_id
    }

    /// Receiver the UI renders from.
    pub fn view(&self) -> watch::Receiver<AuctionDetailView> {
        self.view.subscribe()
    }

    /// Copy of the current view.
    pub fn current(&self) -> AuctionDetailView {
        self.view.borrow().clone()
    }

    /// Validates and places a bid over REST; the view reflects an accepted bid
    /// immediately, before any live echo.
    pub async fn place_bid(&self, amount: f64) -> Result<BidReceipt, BidError> {
        let amount = self.view.borrow().validate_bid(amount)?;
        let receipt = self
            .client
            .api()
            .place_bid(&self.auction_id, amount)
            .await?;

        if let Some(error) = &receipt.error {
            warn!(auction_id = %self.auction_id, amount, error = %error, "bid rejected");
            return Err(BidError::Rejected(error.clone()));
        }

        info!(auction_id = %self.auction_id, amount, "bid accepted");
        self.view
            .send_modify(|view| view.record_accepted_bid(amount, receipt.current_bid));
        Ok(receipt)
    }

    /// Unsubscribes and stops the binding task.
    ///
    /// Returns `None` when another screen still watches the same auction.
    pub fn close(mut self) -> Option<SendOutcome> {
        self.released = true;
        self.binding.abort();
        info!(auction_id = %self.auction_id, "auction screen closed");
        self.client.subscriptions().unsubscribe(&self.auction_id)
    }
}

impl Drop for AuctionDetailScreen {
    fn drop(&mut self) {
        self.binding.abort();
        if !self.released {
            self.client.subscriptions().unsubscribe(&self.auction_id);
        }
    }
}

async fn bind(
    mut feed: AuctionFeed,
    mut connection: broadcast::Receiver<ConnectionEvent>,
    view: Arc<watch::Sender<AuctionDetailView>>,
    effects: broadcast::Sender<ScreenEffect>,
    viewer_logged_in: bool,
) {
    let mut clear_indicator_at: Option<Instant> = None;

    loop {
        tokio::select! {
            event = feed.next() => {
                let Some(event) = event else {
                    debug!(auction_id = %feed.auction_id(), "dispatcher gone, binding stopped");
                    return;
                };
                let mut effect = None;
                view.send_modify(|v| effect = v.apply(&event, viewer_logged_in));

                if let Some(effect) = effect {
                    if matches!(effect, ScreenEffect::Outbid { .. }) {
                        clear_indicator_at = Some(Instant::now() + LIVE_INDICATOR_DURATION);
                    }
                    debug!(auction_id = %effect.auction_id(), message = %effect.message(), "screen effect");
                    // No listeners is fine.
                    let _ = effects.send(effect);
                }
            }
            event = connection.recv() => match event {
                Ok(event) => {
                    view.send_if_modified(|v| {
                        let before = v.connection;
                        v.apply_connection(&event);
                        v.connection != before
                    });
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "connection events lagged");
                }
                Err(RecvError::Closed) => return,
            },
            _ = sleep_until(clear_indicator_at.unwrap_or_else(Instant::now)), if clear_indicator_at.is_some() => {
                clear_indicator_at = None;
                view.send_modify(|v| v.live_indicator = false);
            }
        }
    }
}
