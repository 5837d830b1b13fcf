//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the live auction client.

mod errors;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{AuctionId, BidderId};
pub use money::format_price;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
