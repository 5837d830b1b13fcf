//! REST adapters - AuctionApi implementations.
//!
//! - `http_client` - reqwest client for the marketplace API
//! - `mock_api` - canned responses for tests

mod http_client;
mod mock_api;

pub use http_client::{HttpApiConfig, HttpAuctionApi};
pub use mock_api::MockAuctionApi;
