//! Device handlers: proxied ESP32 status and info queries.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /api/v1/esp32/status` — Rover runtime status.
///
/// # Errors
///
/// Returns [`GatewayError`] when the rover cannot be reached.
#[utoipa::path(
    get,
    path = "/api/v1/esp32/status",
    tag = "Device",
    summary = "Get ESP32 status",
    description = "Queries the rover's runtime status over the active protocol and broadcasts it to WebSocket clients.",
    responses(
        (status = 200, description = "Status retrieved successfully"),
        (status = 503, description = "Rover unreachable", body = ErrorResponse),
        (status = 504, description = "Rover did not answer in time", body = ErrorResponse),
    )
)]
pub async fn esp32_status(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let status = state.platform_service.device_status().await?;
    Ok(Json(status))
}

/// `GET /api/v1/esp32/info` — Rover static information.
///
/// # Errors
///
/// Returns [`GatewayError`] when the rover cannot be reached or reports
/// an error.
#[utoipa::path(
    get,
    path = "/api/v1/esp32/info",
    tag = "Device",
    summary = "Get ESP32 info",
    description = "Queries the rover's firmware name, version, and capabilities over the active protocol.",
    responses(
        (status = 200, description = "Information retrieved successfully"),
        (status = 502, description = "Rover reported an error", body = ErrorResponse),
        (status = 503, description = "Rover unreachable", body = ErrorResponse),
    )
)]
pub async fn esp32_info(State(state): State<AppState>) -> Result<impl IntoResponse, GatewayError> {
    let info = state.platform_service.device_info().await?;
    Ok(Json(info))
}

/// Device routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/esp32/status", get(esp32_status))
        .route("/esp32/info", get(esp32_info))
}
