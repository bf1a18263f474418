//! Shared types for the live raffle server.
//!
//! `objects` holds every JSON shape that crosses the wire (REST bodies and
//! live-update events). The optional `client` feature adds typed HTTP and
//! WebSocket clients on top of them.

pub mod auth;
pub mod objects;

#[cfg(feature = "client")]
pub mod client;
