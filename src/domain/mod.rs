//! Domain layer: pose tracking, movement log, and event system.
//!
//! This module contains the server-side domain model: the movement
//! vocabulary, the dead-reckoned pose tracker, the append-only movement
//! log, and the broadcast bus that feeds browser WebSocket connections.

pub mod direction;
pub mod event_bus;
pub mod history;
pub mod odometry;
pub mod platform_event;
pub mod position;

pub use direction::Direction;
pub use event_bus::EventBus;
pub use history::{MovementLog, MovementRecord};
pub use odometry::{Odometry, PoseSnapshot};
pub use platform_event::{PlatformEvent, Topic};
pub use position::Position;
