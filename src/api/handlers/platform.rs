//! Platform handlers: move, stop, position, history, reset, radius.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::dto::{MoveRequest, PlatformResponse, PositionResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /api/v1/move` — Move the platform.
///
/// # Errors
///
/// Returns [`GatewayError`] when the protocol switch fails, the
/// transport fails, or the rover reports an error.
#[utoipa::path(
    post,
    path = "/api/v1/move",
    tag = "Platform",
    summary = "Move platform",
    description = "Sends a move command to the rover over the requested protocol, advances the estimated pose, and broadcasts the update to WebSocket clients.",
    request_body = MoveRequest,
    responses(
        (status = 200, description = "Command executed successfully", body = PlatformResponse),
        (status = 400, description = "Invalid request parameters", body = ErrorResponse),
        (status = 502, description = "Rover reported an error", body = ErrorResponse),
        (status = 503, description = "Rover unreachable over the requested protocol", body = ErrorResponse),
    )
)]
pub async fn move_platform(
    State(state): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let pose = state
        .platform_service
        .move_platform(req.protocol, req.direction, req.speed, req.angle)
        .await?;

    Ok(Json(PlatformResponse::from_pose(pose, Some(req.direction))))
}

/// `GET /api/v1/stop` — Stop the platform.
///
/// # Errors
///
/// Returns [`GatewayError`] on transport failure or a rover-side error.
#[utoipa::path(
    get,
    path = "/api/v1/stop",
    tag = "Platform",
    summary = "Stop platform",
    description = "Sends a stop command over the active protocol and broadcasts a stationary pose update.",
    responses(
        (status = 200, description = "Platform stopped successfully", body = PlatformResponse),
        (status = 502, description = "Rover reported an error", body = ErrorResponse),
    )
)]
pub async fn stop_platform(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let pose = state.platform_service.stop_platform().await?;
    Ok(Json(PlatformResponse::from_pose(pose, None)))
}

/// `GET /api/v1/position` — Current estimated position.
#[utoipa::path(
    get,
    path = "/api/v1/position",
    tag = "Platform",
    summary = "Get current position",
    description = "Returns the dead-reckoned platform coordinates, heading, and distance travelled.",
    responses(
        (status = 200, description = "Position retrieved successfully", body = PositionResponse),
    )
)]
pub async fn get_position(State(state): State<AppState>) -> impl IntoResponse {
    let pose = state.platform_service.current_position().await;
    Json(PositionResponse::from(pose))
}

/// `GET /api/v1/history` — Movement history.
#[utoipa::path(
    get,
    path = "/api/v1/history",
    tag = "Platform",
    summary = "Get movement history",
    description = "Returns every executed move with the pose it produced, in execution order.",
    responses(
        (status = 200, description = "History retrieved successfully"),
    )
)]
pub async fn get_history(State(state): State<AppState>) -> impl IntoResponse {
    let history = state.platform_service.movement_history().await;
    Json(history)
}

/// `POST /api/v1/reset` — Reset position to the origin.
#[utoipa::path(
    post,
    path = "/api/v1/reset",
    tag = "Platform",
    summary = "Reset position",
    description = "Returns the estimated pose to the origin. The movement history is kept.",
    responses(
        (status = 200, description = "Position reset successfully", body = PlatformResponse),
    )
)]
pub async fn reset_position(State(state): State<AppState>) -> impl IntoResponse {
    let pose = state.platform_service.reset_position().await;
    Json(PlatformResponse::from_pose(pose, None))
}

/// Query parameters for the wheel radius update.
#[derive(Debug, Deserialize)]
pub struct RadiusParams {
    /// New wheel radius in metres.
    pub radius: f64,
}

/// `PATCH /api/v1/radius/update` — Update the wheel radius.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] when the radius is outside
/// the accepted range.
#[utoipa::path(
    patch,
    path = "/api/v1/radius/update",
    tag = "Platform",
    summary = "Update wheel radius",
    description = "Updates the wheel radius used for dead reckoning. Accepts radii between 0.01 and 0.1 metres.",
    params(
        ("radius" = f64, Query, description = "New wheel radius in metres"),
    ),
    responses(
        (status = 200, description = "Radius updated successfully"),
        (status = 400, description = "Invalid radius value", body = ErrorResponse),
    )
)]
pub async fn update_wheel_radius(
    State(state): State<AppState>,
    Query(params): Query<RadiusParams>,
) -> Result<impl IntoResponse, GatewayError> {
    state.platform_service.set_wheel_radius(params.radius).await?;
    Ok(StatusCode::OK)
}

/// Platform routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/move", post(move_platform))
        .route("/stop", get(stop_platform))
        .route("/position", get(get_position))
        .route("/history", get(get_history))
        .route("/reset", post(reset_position))
        .route("/radius/update", patch(update_wheel_radius))
}
