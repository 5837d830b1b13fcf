//! WebSocket adapters for the live auction channel.
//!
//! This module keeps one socket to the auction server open and turns what
//! arrives on it into typed events for the screens.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     SocketConnector (port)                          │
//! │   TungsteniteConnector (production) │ ScriptedConnector (test)      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ one session at a time
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      ConnectionManager                              │
//! │   - connect / disconnect / send                                     │
//! │   - fixed-delay reconnect after abnormal close                      │
//! │   - ping keepalive, idle timeout                                    │
//! │   - ConnectionEvent broadcast                                       │
//! └─────────────────────────────────────────────────────────────────────┘
//!            ▲                                        │
//!            │ subscribe / unsubscribe / bid          │ inbound text
//!            │                                        ▼
//! ┌──────────────────────────┐        ┌─────────────────────────────────┐
//! │   SubscriptionTracker    │        │        EventDispatcher          │
//! │   auction id → interest  │        │   bid_update / auction_update   │
//! └──────────────────────────┘        │   → LiveEvent broadcast         │
//!                                     └─────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - Wire protocol types
//! - [`connection`] - Socket ownership and reconnect
//! - [`subscriptions`] - Channel interest tracking
//! - [`dispatcher`] - Inbound frame fan-out
//! - [`tungstenite`] - Real socket over tokio-tungstenite
//! - [`in_memory`] - Scripted socket for tests

pub mod connection;
pub mod dispatcher;
pub mod in_memory;
pub mod messages;
pub mod subscriptions;
pub mod tungstenite;

pub use connection::{
    ConnectionManager, ConnectionSettings, SendOutcome, DEFAULT_IDLE_TIMEOUT,
    DEFAULT_PING_INTERVAL, USER_DISCONNECT_REASON,
};
pub use dispatcher::{AuctionFeed, DispatchOutcome, EventDispatcher, DEFAULT_EVENT_CAPACITY};
pub use in_memory::{ScriptedConnector, ScriptedServer};
pub use messages::{
    decode_server_frame, BidRequest, Channel, ChannelRequest, ClientMessage, FrameError,
    AUCTION_UPDATE, BID_UPDATE,
};
pub use subscriptions::SubscriptionTracker;
pub use tungstenite::{TungsteniteConnector, DEFAULT_HANDSHAKE_TIMEOUT};
