//! zubid-live - watch auctions on the ZUBID marketplace and log live bids.
//!
//! ```text
//! zubid-live <auction-id>...
//! ```
//!
//! Configuration comes from `ZUBID__*` environment variables (see
//! `zubid_live::config`). Runs until Ctrl-C.

use std::error::Error;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use zubid_live::adapters::{HttpAuctionApi, TungsteniteConnector};
use zubid_live::application::{AuctionDetailScreen, LiveClient, LiveClientOptions};
use zubid_live::config::{AppConfig, LoggingConfig};
use zubid_live::domain::auction::AuctionSnapshot;
use zubid_live::domain::foundation::AuctionId;
use zubid_live::domain::live::LinkState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;
    config.validate()?;

    let auction_ids = std::env::args()
        .skip(1)
        .map(AuctionId::new)
        .collect::<Result<Vec<_>, _>>()?;
    if auction_ids.is_empty() {
        return Err("usage: zubid-live <auction-id>...".into());
    }

    let connector = Arc::new(TungsteniteConnector::new(config.live.handshake_timeout()));
    let api = Arc::new(HttpAuctionApi::new(config.api.http_config())?);
    let options = LiveClientOptions::new(config.live.connection_settings())
        .with_event_capacity(config.live.event_capacity)
        .with_resubscribe(config.live.resubscribe_on_reconnect)
        .with_auth_token(config.api.auth_token.clone());
    let client = LiveClient::new(options, connector, api);

    info!(endpoint = %config.live.ws_url, auctions = auction_ids.len(), "starting live watcher");
    if client.connect_and_wait().await != LinkState::Connected {
        warn!("live socket not connected yet, subscriptions will be dropped until it is");
    }

    let mut screens = Vec::with_capacity(auction_ids.len());
    for auction_id in &auction_ids {
        let screen = match AuctionDetailScreen::load(&client, auction_id).await {
            Ok(screen) => screen,
            Err(e) => {
                warn!(auction_id = %auction_id, error = %e, "snapshot unavailable, watching live only");
                AuctionDetailScreen::open(&client, AuctionSnapshot::placeholder(auction_id.clone()))
                    .await
            }
        };
        log_view_changes(&screen);
        screens.push(screen);
    }

    let badge = client
        .viewer_logged_in()
        .then(|| client.notification_badge(config.notifications.poll_interval()));
    let mut unread = badge.as_ref().map(|b| b.watch());

    let mut effects = client.effects();
    let mut connection = client.connection().subscribe_events();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = connection.recv() => match event {
                Ok(event) => info!(?event, state = %client.state(), "connection event"),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
            effect = effects.recv() => match effect {
                Ok(effect) => info!(auction_id = %effect.auction_id(), "{}", effect.message()),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
            Some(Ok(())) = async {
                match unread.as_mut() {
                    Some(rx) => Some(rx.changed().await),
                    None => None,
                }
            } => {
                if let Some(badge) = &badge {
                    info!(unread = badge.unread(), label = ?badge.label(), "notifications");
                }
            }
        }
    }

    info!("shutting down");
    for screen in screens {
        screen.close();
    }
    client.shutdown().await;
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn Error>> {
    let filter = logging.env_filter()?;
    let (json, plain) = if logging.json {
        (Some(fmt::layer().json()), None)
    } else {
        (None, Some(fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .try_init()?;
    Ok(())
}

fn log_view_changes(screen: &AuctionDetailScreen) {
    let mut view = screen.view();
    tokio::spawn(async move {
        while view.changed().await.is_ok() {
            let current = view.borrow_and_update().clone();
            info!(
                auction_id = %current.auction_id,
                price = %current.price_label(),
                bids = %current.bid_count_label(),
                status = ?current.status,
                connection = current.connection.label(),
                "auction updated"
            );
        }
    });
}
