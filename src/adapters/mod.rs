//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the client core to external systems:
//! - `websocket` - Live socket, subscriptions and event fan-out
//! - `rest` - Marketplace REST API client

pub mod rest;
pub mod websocket;

pub use rest::{HttpApiConfig, HttpAuctionApi, MockAuctionApi};
pub use websocket::{
    AuctionFeed, ConnectionManager, ConnectionSettings, EventDispatcher, ScriptedConnector,
    SendOutcome, SubscriptionTracker, TungsteniteConnector,
};
