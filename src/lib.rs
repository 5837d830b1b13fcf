//! ZUBID Live - live-bid client for the ZUBID auction marketplace
//!
//! This crate keeps one WebSocket open to the marketplace server, tracks
//! which auctions the UI is interested in, turns pushed frames into typed
//! events and binds them to the auction detail screen and notification
//! badge. The auction, bid and payment server itself is an external
//! collaborator reached over REST and that socket.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
