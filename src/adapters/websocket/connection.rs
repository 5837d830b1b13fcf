//! ConnectionManager - owner of the single live socket.
//!
//! ## Lifecycle
//!
//! ```text
//!              connect()                 handshake ok
//! Disconnected ─────────▶ Connecting ─────────────────▶ Connected
//!      ▲                   │    ▲                          │
//!      │    disconnect()   │    │ timer fires / connect()  │ abnormal close,
//!      ├───────────────────┘    │                          │ i/o error
//!      │                   Reconnecting ◀──────────────────┘
//!      │    disconnect()        │ ▲  handshake failed
//!      └────────────────────────┘ └──── (from Connecting)
//! ```
//!
//! A server close with code 1000, `disconnect()` and a handshake error that
//! cannot succeed on retry all land in `Disconnected` without a reconnect.
//!
//! ## Keepalive
//!
//! An open session pings the server every `ping_interval`. If nothing at all
//! arrives for `idle_timeout`, the socket is treated as half-open and fails
//! like any other abnormal close.
//!
//! ## Tasks
//!
//! Each socket is driven by one spawned session task that selects between
//! inbound frames and an unbounded outbound command channel. A failure arms
//! one reconnect timer task; arming always aborts the previous timer first.
//! Both kinds of task carry the generation they were started for and become
//! no-ops once the manager has moved on, so at most one socket exists.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::foundation::StateMachine;
use crate::domain::live::{ConnectionEvent, LinkState, ReconnectPolicy};
use crate::ports::{InboundFrame, SocketConnector, SocketSession, TransportError, NORMAL_CLOSURE};

use super::dispatcher::EventDispatcher;
use super::messages::ClientMessage;

/// Close reason sent on a user-initiated disconnect.
pub const USER_DISCONNECT_REASON: &str = "User disconnected";

/// Default gap between keepalive pings.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(20);

/// Default silence after which an open socket is considered dead.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECTION_EVENT_CAPACITY: usize = 32;

/// Where to connect and how to retry.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// `ws://` or `wss://` endpoint.
    pub url: String,

    /// Delay schedule after a failure.
    pub reconnect: ReconnectPolicy,

    /// Gap between pings on an open socket.
    pub ping_interval: Duration,

    /// Longest silence tolerated from the server.
    pub idle_timeout: Duration,
}

impl ConnectionSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: ReconnectPolicy::default(),
            ping_interval: DEFAULT_PING_INTERVAL,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Replace the reconnect schedule.
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Replace the ping interval and idle timeout.
    pub fn with_keepalive(mut self, ping_interval: Duration, idle_timeout: Duration) -> Self {
        self.ping_interval = ping_interval;
        self.idle_timeout = idle_timeout;
        self
    }
}

/// Result of `ConnectionManager::send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Handed to the open socket.
    Sent,
    /// Not connected; the frame was discarded.
    Dropped,
}

#[derive(Debug)]
enum Outbound {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Debug)]
enum SessionEnd {
    ClosedNormally { reason: String },
    ClosedByPeer { code: Option<u16>, reason: String },
    ClosedLocally,
    StreamEnded,
    Failed(TransportError),
}

#[derive(Default)]
struct Inner {
    state: LinkState,
    generation: u64,
    auth_token: Option<SecretString>,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
    session_task: Option<JoinHandle<()>>,
    reconnect_task: Option<JoinHandle<()>>,
    failed_attempts: u32,
}

/// Owns at most one live socket and keeps it open.
///
/// Construct once at the application root and share through an `Arc`.
/// `connect` and `disconnect` must be called from within a Tokio runtime.
///
/// # Thread Safety
///
/// State sits behind a `std::sync::Mutex` that is never held across an
/// `.await`, so every public method is synchronous and cheap. Connection
/// events are emitted while the lock is held, which keeps them in
/// transition order.
pub struct ConnectionManager {
    connector: Arc<dyn SocketConnector>,
    dispatcher: Arc<EventDispatcher>,
    settings: ConnectionSettings,
    events: broadcast::Sender<ConnectionEvent>,
    inner: Mutex<Inner>,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn SocketConnector>,
        dispatcher: Arc<EventDispatcher>,
        settings: ConnectionSettings,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(CONNECTION_EVENT_CAPACITY);
        Arc::new(Self {
            connector,
            dispatcher,
            settings,
            events,
            inner: Mutex::new(Inner::default()),
        })
    }

    /// Opens the socket unless one is already open or opening.
    ///
    /// While a reconnect is pending the timer is cancelled and the socket is
    /// opened immediately. The token is sent as a bearer token and reused by
    /// later reconnects.
    pub fn connect(self: &Arc<Self>, auth_token: Option<SecretString>) {
        let mut inner = self.lock();
        match inner.state {
            LinkState::Connecting | LinkState::Connected => {
                debug!(state = %inner.state, "connect ignored, socket already open");
                return;
            }
            LinkState::Reconnecting => {
                if let Some(timer) = inner.reconnect_task.take() {
                    timer.abort();
                }
            }
            LinkState::Disconnected => {}
        }
        inner.auth_token = auth_token;
        inner.failed_attempts = 0;
        self.open_session(&mut inner);
    }

    /// Closes the socket with code 1000 and cancels any pending reconnect.
    pub fn disconnect(&self) {
        drop(self.disconnect_inner());
    }

    /// Like `disconnect`, then waits until the close frame has been written.
    pub async fn shutdown(&self) {
        if let Some(task) = self.disconnect_inner() {
            let _ = task.await;
        }
    }

    /// Sends one frame if connected; otherwise logs and drops it.
    pub fn send(&self, message: &ClientMessage) -> SendOutcome {
        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, frame_type = message.frame_type(), "failed to encode frame");
                return SendOutcome::Dropped;
            }
        };

        let inner = self.lock();
        if !inner.state.can_send() {
            warn!(
                frame_type = message.frame_type(),
                auction_id = %message.auction_id(),
                state = %inner.state,
                "cannot send message, not connected"
            );
            return SendOutcome::Dropped;
        }

        match &inner.outbound {
            Some(tx) if tx.send(Outbound::Text(text)).is_ok() => {
                debug!(
                    frame_type = message.frame_type(),
                    auction_id = %message.auction_id(),
                    "frame queued"
                );
                SendOutcome::Sent
            }
            _ => {
                warn!(frame_type = message.frame_type(), "session gone, frame dropped");
                SendOutcome::Dropped
            }
        }
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        self.lock().state
    }

    /// Reader for connection events from now on.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    /// Dispatcher that inbound frames are routed to.
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ConnectionEvent) {
        // No listeners is fine.
        let _ = self.events.send(event);
    }

    fn transition(&self, inner: &mut Inner, target: LinkState) {
        match inner.state.transition_to(target) {
            Ok(next) => {
                info!(from = %inner.state, to = %next, generation = inner.generation, "link state changed");
                inner.state = next;
            }
            Err(e) => {
                warn!(error = %e, "unexpected link state change");
                inner.state = target;
            }
        }
    }

    fn open_session(self: &Arc<Self>, inner: &mut Inner) {
        inner.generation += 1;
        let generation = inner.generation;
        self.transition(inner, LinkState::Connecting);

        let (tx, rx) = mpsc::unbounded_channel();
        inner.outbound = Some(tx);

        let manager = Arc::downgrade(self);
        let connector = Arc::clone(&self.connector);
        let dispatcher = Arc::clone(&self.dispatcher);
        let settings = self.settings.clone();
        let token = inner.auth_token.clone();

        info!(endpoint = %settings.url, generation, "opening live socket");
        inner.session_task = Some(tokio::spawn(async move {
            run_session(manager, connector, dispatcher, settings, token, generation, rx).await;
        }));
    }

    /// Returns the session task to await when a close frame is in flight.
    fn disconnect_inner(&self) -> Option<JoinHandle<()>> {
        let mut inner = self.lock();
        if let Some(timer) = inner.reconnect_task.take() {
            timer.abort();
        }

        let mut closing = None;
        match inner.state {
            LinkState::Disconnected => {
                debug!("disconnect ignored, no socket");
                return None;
            }
            LinkState::Connecting => {
                if let Some(task) = inner.session_task.take() {
                    task.abort();
                }
            }
            LinkState::Connected => {
                if let Some(tx) = &inner.outbound {
                    let _ = tx.send(Outbound::Close {
                        code: NORMAL_CLOSURE,
                        reason: USER_DISCONNECT_REASON.to_string(),
                    });
                }
                closing = inner.session_task.take();
            }
            LinkState::Reconnecting => {}
        }

        inner.outbound = None;
        inner.generation += 1;
        inner.failed_attempts = 0;
        self.transition(&mut inner, LinkState::Disconnected);
        self.emit(ConnectionEvent::Disconnected);
        closing
    }

    fn mark_connected(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation || inner.state != LinkState::Connecting {
            return false;
        }
        inner.failed_attempts = 0;
        self.transition(&mut inner, LinkState::Connected);
        self.emit(ConnectionEvent::Connected);
        true
    }

    fn finish_session(self: &Arc<Self>, generation: u64, end: SessionEnd) {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(generation, "stale session finished");
            return;
        }
        inner.outbound = None;
        // The handle belongs to the task running this code; detach it.
        inner.session_task = None;

        match end {
            SessionEnd::ClosedLocally => {}
            SessionEnd::ClosedNormally { reason } => {
                info!(reason = %reason, "server closed the socket normally");
                self.transition(&mut inner, LinkState::Disconnected);
                self.emit(ConnectionEvent::Disconnected);
            }
            SessionEnd::ClosedByPeer { code, reason } => {
                let message = match code {
                    Some(code) => format!("closed with code {code}: {reason}"),
                    None => format!("closed without status: {reason}"),
                };
                self.fail(&mut inner, message);
            }
            SessionEnd::StreamEnded => {
                self.fail(&mut inner, "connection lost".to_string());
            }
            SessionEnd::Failed(e) => self.fail(&mut inner, e.to_string()),
        }
    }

    fn handshake_failed(self: &Arc<Self>, generation: u64, error: TransportError) {
        let mut inner = self.lock();
        if inner.generation != generation {
            return;
        }
        inner.outbound = None;
        inner.session_task = None;
        warn!(endpoint = %self.settings.url, error = %error, "handshake failed");

        if !error.is_retryable() {
            self.emit(ConnectionEvent::Error(error.to_string()));
            warn!(endpoint = %self.settings.url, "endpoint unusable, not reconnecting");
            self.transition(&mut inner, LinkState::Disconnected);
            self.emit(ConnectionEvent::Disconnected);
            return;
        }
        self.fail(&mut inner, error.to_string());
    }

    fn fail(self: &Arc<Self>, inner: &mut Inner, message: String) {
        self.emit(ConnectionEvent::Error(message));
        inner.failed_attempts = inner.failed_attempts.saturating_add(1);

        match self.settings.reconnect.delay_for(inner.failed_attempts) {
            Some(delay) => {
                self.transition(inner, LinkState::Reconnecting);
                self.schedule_reconnect(inner, delay);
            }
            None => {
                warn!(attempts = inner.failed_attempts, "giving up on reconnecting");
                self.transition(inner, LinkState::Disconnected);
                self.emit(ConnectionEvent::Disconnected);
            }
        }
    }

    fn schedule_reconnect(self: &Arc<Self>, inner: &mut Inner, delay: Duration) {
        if let Some(timer) = inner.reconnect_task.take() {
            timer.abort();
        }

        let generation = inner.generation;
        let manager = Arc::downgrade(self);
        info!(delay_ms = delay.as_millis() as u64, generation, "reconnect scheduled");
        inner.reconnect_task = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            if let Some(manager) = manager.upgrade() {
                manager.reconnect(generation);
            }
        }));
    }

    fn reconnect(self: &Arc<Self>, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation || inner.state != LinkState::Reconnecting {
            return;
        }
        // This runs on the timer task itself.
        inner.reconnect_task = None;
        info!(attempt = inner.failed_attempts, "reconnecting");
        self.open_session(&mut inner);
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = inner.reconnect_task.take() {
            timer.abort();
        }
    }
}

async fn run_session(
    manager: Weak<ConnectionManager>,
    connector: Arc<dyn SocketConnector>,
    dispatcher: Arc<EventDispatcher>,
    settings: ConnectionSettings,
    token: Option<SecretString>,
    generation: u64,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    let mut session = match connector.connect(&settings.url, token.as_ref()).await {
        Ok(session) => session,
        Err(e) => {
            if let Some(manager) = manager.upgrade() {
                manager.handshake_failed(generation, e);
            }
            return;
        }
    };

    let accepted = manager
        .upgrade()
        .map(|m| m.mark_connected(generation))
        .unwrap_or(false);
    if !accepted {
        let _ = session.close(NORMAL_CLOSURE, USER_DISCONNECT_REASON).await;
        return;
    }

    let end = pump(session.as_mut(), &dispatcher, &settings, &mut outbound).await;
    debug!(generation, end = ?end, "session ended");

    if let Some(manager) = manager.upgrade() {
        manager.finish_session(generation, end);
    }
}

async fn pump(
    session: &mut dyn SocketSession,
    dispatcher: &EventDispatcher,
    settings: &ConnectionSettings,
    outbound: &mut mpsc::UnboundedReceiver<Outbound>,
) -> SessionEnd {
    let mut pings = time::interval_at(
        Instant::now() + settings.ping_interval,
        settings.ping_interval,
    );
    pings.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let idle = time::sleep(settings.idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = session.send_text(text).await {
                        return SessionEnd::Failed(e);
                    }
                }
                Some(Outbound::Close { code, reason }) => {
                    if let Err(e) = session.close(code, &reason).await {
                        debug!(error = %e, "close frame not delivered");
                    }
                    return SessionEnd::ClosedLocally;
                }
                None => {
                    let _ = session.close(NORMAL_CLOSURE, USER_DISCONNECT_REASON).await;
                    return SessionEnd::ClosedLocally;
                }
            },
            frame = session.next_frame() => match frame {
                Some(Ok(frame)) => {
                    idle.as_mut().reset(Instant::now() + settings.idle_timeout);
                    let normal = frame.is_normal_close();
                    match frame {
                        InboundFrame::Text(text) => {
                            dispatcher.dispatch(&text);
                        }
                        InboundFrame::Pong => {}
                        InboundFrame::Close { reason, .. } if normal => {
                            return SessionEnd::ClosedNormally { reason };
                        }
                        InboundFrame::Close { code, reason } => {
                            return SessionEnd::ClosedByPeer { code, reason };
                        }
                    }
                }
                Some(Err(e)) => return SessionEnd::Failed(e),
                None => return SessionEnd::StreamEnded,
            },
            _ = pings.tick() => {
                if let Err(e) = session.ping().await {
                    return SessionEnd::Failed(e);
                }
            }
            () = &mut idle => {
                warn!(
                    idle_secs = settings.idle_timeout.as_secs(),
                    "no traffic from server, dropping socket"
                );
                return SessionEnd::Failed(TransportError::io("keepalive timeout"));
            }
        }
    }
}
