//! # rover-gateway
//!
//! REST API and WebSocket gateway for an ESP32-based rover platform.
//!
//! This crate exposes movement commands over HTTP, tracks the rover's
//! pose by dead reckoning, and fans platform updates out to browser
//! clients over WebSocket. The rover itself is reached over one of
//! three switchable transports: HTTP, WebSocket, or MQTT.
//!
//! ## Architecture
//!
//! ```text
//! Browser clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Broadcast (ws/)
//!     │
//!     ├── PlatformService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── Odometry + MovementLog (domain/)
//!     │
//!     └── DeviceLink: HTTP | WebSocket | MQTT (link/)
//!             │
//!             └── ESP32 rover
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod link;
pub mod service;
pub mod ws;
