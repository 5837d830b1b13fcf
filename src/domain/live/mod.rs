//! Live channel vocabulary: events, socket lifecycle, reconnect schedule.

mod events;
mod link_state;
mod reconnect;

pub use events::{AuctionStatus, AuctionStatusEvent, BidUpdate, ConnectionEvent, LiveEvent};
pub use link_state::LinkState;
pub use reconnect::{ReconnectPolicy, DEFAULT_RECONNECT_DELAY};
