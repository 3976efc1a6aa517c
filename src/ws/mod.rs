//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams lifecycle events of the guilds a
//! client subscribed to and answers registry snapshot requests.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
