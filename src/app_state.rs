//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::PlatformService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Platform service for all business logic.
    pub platform_service: Arc<PlatformService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}
