//! Scripted in-memory socket for testing.
//!
//! Provides a `SocketConnector` whose sessions are driven from the test
//! through `ScriptedServer` handles, so connection behaviour can be checked
//! without a network.
//!
//! # Features
//!
//! - Handshake failure injection
//! - Simulated handshake latency
//! - Server-side pushes, close frames and dropped connections
//! - Automatic pong replies, or a silent peer that stops answering
//! - Recording of every frame and close the client sent
//!
//! # Example
//!
//! ```ignore
//! let connector = ScriptedConnector::new();
//! manager.connect(None);
//! connector.server(0).push_text(r#"{"type":"bid_update", ...}"#);
//! connector.server(0).close(1006, "abnormal");
//! ```

use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::ports::{InboundFrame, SocketConnector, SocketSession, TransportError};

/// Scripted connector for testing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    failures: Arc<Mutex<VecDeque<TransportError>>>,
    servers: Arc<Mutex<Vec<ScriptedServer>>>,
    attempts: Arc<Mutex<Vec<Option<SecretString>>>>,
    handshake_delay: Duration,
}

impl ScriptedConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Connector whose handshakes take `delay` to complete.
    pub fn with_handshake_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            handshake_delay: delay,
            ..Self::default()
        })
    }

    /// Make the next handshake fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.fail_next_with(TransportError::handshake(message));
    }

    /// Make the next handshake fail with `error`.
    pub fn fail_next_with(&self, error: TransportError) {
        self.failures.lock().unwrap().push_back(error);
    }

    /// Handshake attempts so far, failed ones included.
    pub fn connect_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    /// Bearer tokens presented on each attempt.
    pub fn tokens(&self) -> Vec<Option<SecretString>> {
        self.attempts.lock().unwrap().clone()
    }

    /// Server side of the `index`-th successful handshake.
    ///
    /// # Panics
    ///
    /// If fewer than `index + 1` sessions have been opened.
    pub fn server(&self, index: usize) -> ScriptedServer {
        self.servers
            .lock()
            .unwrap()
            .get(index)
            .cloned()
            .unwrap_or_else(|| panic!("no scripted session #{index}"))
    }

    /// Successful handshakes so far.
    pub fn session_count(&self) -> usize {
        self.servers.lock().unwrap().len()
    }

    /// Sessions neither side has closed yet.
    pub fn open_sessions(&self) -> usize {
        self.servers
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.is_closed())
            .count()
    }
}

#[async_trait]
impl SocketConnector for ScriptedConnector {
    async fn connect(
        &self,
        _url: &str,
        auth_token: Option<&SecretString>,
    ) -> Result<Box<dyn SocketSession>, TransportError> {
        self.attempts.lock().unwrap().push(auth_token.cloned());

        if !self.handshake_delay.is_zero() {
            sleep(self.handshake_delay).await;
        }

        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();
        let shared = Arc::new(ServerShared {
            to_client,
            from_client: tokio::sync::Mutex::new(from_client),
            client_close: Mutex::new(None),
            closed: AtomicBool::new(false),
            silent: AtomicBool::new(false),
            pings: AtomicUsize::new(0),
        });
        self.servers.lock().unwrap().push(ScriptedServer {
            shared: Arc::clone(&shared),
        });

        Ok(Box::new(ScriptedSession {
            inbound,
            outbound,
            shared,
        }))
    }
}

#[derive(Debug)]
enum ServerAction {
    Text(String),
    Pong,
    Close { code: u16, reason: String },
    Drop,
}

#[derive(Debug)]
struct ServerShared {
    to_client: mpsc::UnboundedSender<ServerAction>,
    from_client: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
    client_close: Mutex<Option<(u16, String)>>,
    closed: AtomicBool,
    silent: AtomicBool,
    pings: AtomicUsize,
}

/// Test-side handle on one scripted session.
#[derive(Debug, Clone)]
pub struct ScriptedServer {
    shared: Arc<ServerShared>,
}

impl ScriptedServer {
    /// Deliver a text frame to the client.
    pub fn push_text(&self, text: impl Into<String>) {
        let _ = self.shared.to_client.send(ServerAction::Text(text.into()));
    }

    /// Send a close frame to the client.
    pub fn close(&self, code: u16, reason: impl Into<String>) {
        let _ = self.shared.to_client.send(ServerAction::Close {
            code,
            reason: reason.into(),
        });
    }

    /// End the stream without a close frame.
    pub fn drop_connection(&self) {
        let _ = self.shared.to_client.send(ServerAction::Drop);
    }

    /// Next text frame the client sent; `None` once the session is gone.
    pub async fn next_sent(&self) -> Option<String> {
        self.shared.from_client.lock().await.recv().await
    }

    /// Close code and reason the client sent, if it closed.
    pub fn client_close(&self) -> Option<(u16, String)> {
        self.shared.client_close.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Stop answering pings while keeping the socket open.
    pub fn go_silent(&self) {
        self.shared.silent.store(true, Ordering::SeqCst);
    }

    /// Pings the client has sent on this session.
    pub fn pings_received(&self) -> usize {
        self.shared.pings.load(Ordering::SeqCst)
    }
}

struct ScriptedSession {
    inbound: mpsc::UnboundedReceiver<ServerAction>,
    outbound: mpsc::UnboundedSender<String>,
    shared: Arc<ServerShared>,
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SocketSession for ScriptedSession {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.outbound.send(text).map_err(|_| TransportError::Closed)
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.shared.pings.fetch_add(1, Ordering::SeqCst);
        if !self.shared.silent.load(Ordering::SeqCst) {
            let _ = self.shared.to_client.send(ServerAction::Pong);
        }
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<Result<InboundFrame, TransportError>> {
        match self.inbound.recv().await {
            Some(ServerAction::Text(text)) => Some(Ok(InboundFrame::Text(text))),
            Some(ServerAction::Pong) => Some(Ok(InboundFrame::Pong)),
            Some(ServerAction::Close { code, reason }) => {
                self.shared.closed.store(true, Ordering::SeqCst);
                Some(Ok(InboundFrame::Close {
                    code: Some(code),
                    reason,
                }))
            }
            Some(ServerAction::Drop) | None => {
                self.shared.closed.store(true, Ordering::SeqCst);
                None
            }
        }
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError> {
        *self.shared.client_close.lock().unwrap() = Some((code, reason.to_string()));
        self.shared.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
