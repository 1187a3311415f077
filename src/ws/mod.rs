//! Browser-facing WebSocket layer: connection handling, message
//! routing, topic subscriptions.
//!
//! The WebSocket endpoint at `/ws` pushes platform updates, protocol
//! status messages, and errors to dashboard clients, filtered per
//! connection by topic subscription.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
