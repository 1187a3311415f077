//! rover-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use rover_gateway::api;
use rover_gateway::app_state::AppState;
use rover_gateway::config::RoverConfig;
use rover_gateway::domain::EventBus;
use rover_gateway::service::{LinkSet, PlatformService};
use rover_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RoverConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting rover-gateway");

    // Build domain layer
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Build device links and service layer
    let links = LinkSet::from_config(&config);
    let platform_service = Arc::new(PlatformService::new(links, event_bus.clone()));

    // Build application state
    let app_state = AppState {
        platform_service,
        event_bus,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
