//! Domain layer: value objects and pure state for the live auction client.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, price labels, errors)
//! - `live` - Live events, socket lifecycle and reconnect schedule
//! - `auction` - Auction snapshot, detail view model and notifications

pub mod auction;
pub mod foundation;
pub mod live;
