//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the client core and the outside world. Adapters implement these ports.
//!
//! ## Live Ports
//!
//! - `SocketConnector` - Opens the live WebSocket
//! - `SocketSession` - Exchanges frames on one open socket
//!
//! ## REST Ports
//!
//! - `AuctionApi` - Auction snapshots, bids and notifications

mod auction_api;
mod socket;

pub use auction_api::{ApiError, AuctionApi, BidReceipt};
pub use socket::{InboundFrame, SocketConnector, SocketSession, TransportError, NORMAL_CLOSURE};
