//! `SocketConnector` over `tokio-tungstenite`.
//!
//! Plain `ws://` and TLS `wss://` endpoints are both supported; TLS goes
//! through native-tls. Pings from the server are answered by tungstenite
//! itself; pongs to our own pings surface as `InboundFrame::Pong`.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::ports::{InboundFrame, SocketConnector, SocketSession, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default time allowed for TCP, TLS and the HTTP upgrade together.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens real WebSocket connections.
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    handshake_timeout: Duration,
}

impl TungsteniteConnector {
    pub fn new(handshake_timeout: Duration) -> Self {
        Self { handshake_timeout }
    }
}

impl Default for TungsteniteConnector {
    fn default() -> Self {
        Self::new(DEFAULT_HANDSHAKE_TIMEOUT)
    }
}

#[async_trait]
impl SocketConnector for TungsteniteConnector {
    async fn connect(
        &self,
        url: &str,
        auth_token: Option<&SecretString>,
    ) -> Result<Box<dyn SocketSession>, TransportError> {
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(TransportError::invalid_endpoint(
                url,
                "scheme must be ws:// or wss://",
            ));
        }

        let mut request = url
            .into_client_request()
            .map_err(|e| TransportError::invalid_endpoint(url, e.to_string()))?;

        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|_| TransportError::handshake("auth token is not a valid header value"))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (stream, response) = time::timeout(self.handshake_timeout, connect_async(request))
            .await
            .map_err(|_| {
                TransportError::handshake(format!(
                    "timed out after {}s",
                    self.handshake_timeout.as_secs()
                ))
            })?
            .map_err(|e| TransportError::handshake(e.to_string()))?;

        debug!(endpoint = %url, status = response.status().as_u16(), "websocket upgraded");
        Ok(Box::new(TungsteniteSession { stream }))
    }
}

struct TungsteniteSession {
    stream: WsStream,
}

#[async_trait]
impl SocketSession for TungsteniteSession {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::text(text))
            .await
            .map_err(map_ws_error)
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        self.stream
            .send(Message::Ping(Default::default()))
            .await
            .map_err(map_ws_error)
    }

    async fn next_frame(&mut self) -> Option<Result<InboundFrame, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(InboundFrame::Text(text.to_string()))),
                Ok(Message::Close(frame)) => {
                    let (code, reason) = match frame {
                        Some(frame) => (Some(u16::from(frame.code)), frame.reason.to_string()),
                        None => (None, String::new()),
                    };
                    return Some(Ok(InboundFrame::Close { code, reason }));
                }
                Ok(Message::Binary(bytes)) => {
                    debug!(len = bytes.len(), "ignoring binary frame");
                }
                Ok(Message::Pong(_)) => return Some(Ok(InboundFrame::Pong)),
                Ok(Message::Ping(_) | Message::Frame(_)) => {}
                Err(e) => return Some(Err(map_ws_error(e))),
            }
        }
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        };
        match self.stream.close(Some(frame)).await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(map_ws_error(e)),
        }
    }
}

fn map_ws_error(error: WsError) -> TransportError {
    match error {
        WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
        other => TransportError::io(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_websocket_scheme() {
        let connector = TungsteniteConnector::default();
        let err = connector
            .connect("https://zubid-2025.onrender.com/ws", None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, TransportError::InvalidEndpoint { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_handshake_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let connector = TungsteniteConnector::new(Duration::from_secs(2));
        let err = connector
            .connect(&format!("ws://127.0.0.1:{port}/ws"), None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, TransportError::Handshake(_)));
    }
}
