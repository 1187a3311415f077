//! Move request DTO.

use serde::Deserialize;

use crate::domain::Direction;
use crate::link::Protocol;

/// Request body for `POST /api/v1/move`.
///
/// Speed is a `u8`, so the 0–255 bound is enforced by the type; out of
/// range values are rejected during deserialization.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct MoveRequest {
    /// Movement direction.
    pub direction: Direction,
    /// Motor speed, 0–255.
    pub speed: u8,
    /// Optional target heading in degrees.
    #[serde(default)]
    pub angle: Option<f64>,
    /// Transport to carry the command over.
    pub protocol: Protocol,
}
