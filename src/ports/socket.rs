//! Socket Port - Interface for the live WebSocket transport.
//!
//! The connection manager drives one session at a time through this port, so
//! it can be exercised against a scripted in-memory socket as easily as a
//! real server.
//!
//! # Design
//!
//! - `SocketConnector` performs the handshake and hands back an open session
//! - `SocketSession` exchanges text frames until either side closes
//! - Pings go out through the session; pongs come back as frames so the
//!   caller can tell a live peer from a silent one
//! - Close codes surface unchanged so the caller can tell a normal close
//!   from a failure

use async_trait::async_trait;
use secrecy::SecretString;

/// Close code for a clean, intentional shutdown.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Frame read from an open session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// A UTF-8 text payload.
    Text(String),
    /// Reply to one of our pings.
    Pong,
    /// The peer closed the socket. `code` is `None` when the close frame
    /// carried no status.
    Close { code: Option<u16>, reason: String },
}

impl InboundFrame {
    /// True for a close that should not trigger a reconnect.
    pub fn is_normal_close(&self) -> bool {
        matches!(self, InboundFrame::Close { code: Some(NORMAL_CLOSURE), .. })
    }
}

/// Port for opening live sockets.
#[async_trait]
pub trait SocketConnector: Send + Sync {
    /// Opens a socket to `url`, sending `auth_token` as a bearer token on the
    /// handshake when present.
    async fn connect(
        &self,
        url: &str,
        auth_token: Option<&SecretString>,
    ) -> Result<Box<dyn SocketSession>, TransportError>;
}

/// One open socket.
#[async_trait]
pub trait SocketSession: Send {
    /// Writes one text frame.
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Writes one ping control frame.
    async fn ping(&mut self) -> Result<(), TransportError>;

    /// Waits for the next frame. `None` means the stream ended without a
    /// close frame.
    async fn next_frame(&mut self) -> Option<Result<InboundFrame, TransportError>>;

    /// Sends a close frame and flushes it.
    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError>;
}

/// Transport failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The endpoint could not be turned into a request.
    #[error("invalid endpoint '{url}': {reason}")]
    InvalidEndpoint {
        /// Endpoint as configured.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// TCP, TLS or HTTP upgrade failed.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Read or write on an open socket failed.
    #[error("socket i/o error: {0}")]
    Io(String),

    /// The socket is already closed.
    #[error("socket closed")]
    Closed,
}

impl TransportError {
    /// Creates an invalid endpoint error.
    pub fn invalid_endpoint(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a handshake error.
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake(message.into())
    }

    /// Creates an i/o error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    /// Returns true if a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::InvalidEndpoint { .. })
    }
}
