//! LiveClient - application root for the live-bid stack.
//!
//! Owns the single `ConnectionManager`, the dispatcher it feeds and the
//! subscription tracker, and hands them to screens. There is exactly one
//! client per logged-in app session; it is passed around explicitly.

use std::sync::{Arc, Weak};
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::adapters::websocket::{
    ConnectionManager, ConnectionSettings, EventDispatcher, SubscriptionTracker,
    DEFAULT_EVENT_CAPACITY,
};
use crate::domain::auction::ScreenEffect;
use crate::domain::live::{ConnectionEvent, LinkState};
use crate::ports::{AuctionApi, SocketConnector};

use super::screens::NotificationBadge;

const EFFECT_CAPACITY: usize = 64;

/// How the client connects and what it does after a reconnect.
#[derive(Debug, Clone)]
pub struct LiveClientOptions {
    pub connection: ConnectionSettings,
    /// Events buffered per dispatcher reader.
    pub event_capacity: usize,
    /// Re-send every recorded subscription each time the socket connects.
    pub resubscribe_on_reconnect: bool,
    /// Bearer token for the handshake; also marks the viewer as logged in.
    pub auth_token: Option<SecretString>,
}

impl LiveClientOptions {
    pub fn new(connection: ConnectionSettings) -> Self {
        Self {
            connection,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            resubscribe_on_reconnect: false,
            auth_token: None,
        }
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn with_resubscribe(mut self, enabled: bool) -> Self {
        self.resubscribe_on_reconnect = enabled;
        self
    }

    pub fn with_auth_token(mut self, token: Option<SecretString>) -> Self {
        self.auth_token = token;
        self
    }
}

/// Live-bid client shared by every screen.
pub struct LiveClient {
    connection: Arc<ConnectionManager>,
    subscriptions: Arc<SubscriptionTracker>,
    api: Arc<dyn AuctionApi>,
    auth_token: Option<SecretString>,
    effects: broadcast::Sender<ScreenEffect>,
    resubscriber: Option<JoinHandle<()>>,
}

impl LiveClient {
    /// Wires the live stack. Must be called inside a Tokio runtime.
    pub fn new(
        options: LiveClientOptions,
        connector: Arc<dyn SocketConnector>,
        api: Arc<dyn AuctionApi>,
    ) -> Arc<Self> {
        let dispatcher = Arc::new(EventDispatcher::new(options.event_capacity));
        let connection = ConnectionManager::new(connector, dispatcher, options.connection);
        let subscriptions = Arc::new(SubscriptionTracker::new(Arc::clone(&connection)));
        let (effects, _) = broadcast::channel(EFFECT_CAPACITY);

        let resubscriber = options.resubscribe_on_reconnect.then(|| {
            let events = connection.subscribe_events();
            let tracker = Arc::downgrade(&subscriptions);
            tokio::spawn(resubscribe_on_connect(events, tracker))
        });

        Arc::new(Self {
            connection,
            subscriptions,
            api,
            auth_token: options.auth_token,
            effects,
            resubscriber,
        })
    }

    /// Opens the socket with the configured token. Idempotent.
    pub fn connect(&self) {
        self.connection.connect(self.auth_token.clone());
    }

    /// Connects and waits for the handshake outcome.
    ///
    /// Returns the link state once the socket is connected, or once the
    /// attempt has failed or been cancelled.
    pub async fn connect_and_wait(&self) -> LinkState {
        let mut events = self.connection.subscribe_events();
        self.connect();

        while self.connection.state() == LinkState::Connecting {
            match events.recv().await {
                Ok(event) => {
                    debug!(?event, "handshake settled");
                    break;
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        self.connection.state()
    }

    /// Closes the socket and cancels any pending reconnect.
    pub fn disconnect(&self) {
        self.connection.disconnect();
    }

    /// Disconnects and waits for the close frame to go out.
    pub async fn shutdown(&self) {
        info!("shutting down live client");
        self.connection.shutdown().await;
    }

    pub fn state(&self) -> LinkState {
        self.connection.state()
    }

    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.connection
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        self.connection.dispatcher()
    }

    pub fn subscriptions(&self) -> &Arc<SubscriptionTracker> {
        &self.subscriptions
    }

    pub fn api(&self) -> &Arc<dyn AuctionApi> {
        &self.api
    }

    /// Whether live events should be treated as someone else outbidding us.
    pub fn viewer_logged_in(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Reader for screen effects (outbid, ended, ending soon) from now on.
    pub fn effects(&self) -> broadcast::Receiver<ScreenEffect> {
        self.effects.subscribe()
    }

    pub(crate) fn effect_sender(&self) -> broadcast::Sender<ScreenEffect> {
        self.effects.clone()
    }

    /// Starts a notification badge fed by this client's API and effects.
    pub fn notification_badge(&self, poll_interval: Duration) -> NotificationBadge {
        NotificationBadge::start(Arc::clone(&self.api), self.effects(), poll_interval)
    }
}

impl Drop for LiveClient {
    fn drop(&mut self) {
        if let Some(task) = self.resubscriber.take() {
            task.abort();
        }
        self.connection.disconnect();
    }
}

async fn resubscribe_on_connect(
    mut events: broadcast::Receiver<ConnectionEvent>,
    tracker: Weak<SubscriptionTracker>,
) {
    loop {
        match events.recv().await {
            Ok(ConnectionEvent::Connected) => {
                let Some(tracker) = tracker.upgrade() else {
                    return;
                };
                tracker.resend_all();
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "connection events lagged");
            }
            Err(RecvError::Closed) => return,
        }
    }
}
