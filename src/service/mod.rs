//! Service layer: business logic orchestration.
//!
//! [`PlatformService`] coordinates movement commands, delegates
//! transport to the device links, and emits events through the
//! [`crate::domain::EventBus`].

pub mod platform_service;

pub use platform_service::{LinkSet, PlatformService};
