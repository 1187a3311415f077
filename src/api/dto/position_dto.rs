//! Position query response DTO.

use serde::Serialize;

use crate::domain::PoseSnapshot;

/// Response body for `GET /api/v1/position`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PositionResponse {
    /// Metres along the X axis.
    pub x: f64,
    /// Metres along the Y axis.
    pub y: f64,
    /// Cumulative distance travelled in metres.
    pub distance_travelled: f64,
    /// Heading in degrees.
    pub angle: f64,
}

impl From<PoseSnapshot> for PositionResponse {
    fn from(pose: PoseSnapshot) -> Self {
        Self {
            x: pose.position.x,
            y: pose.position.y,
            distance_travelled: pose.total_distance,
            angle: pose.angle_deg,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Position;

    #[test]
    fn flattens_the_pose() {
        let pose = PoseSnapshot {
            position: Position::new(3.0, 4.0),
            angle_deg: 90.0,
            total_distance: 7.0,
        };
        let json = serde_json::to_value(PositionResponse::from(pose)).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert_eq!(json.get("x").and_then(serde_json::Value::as_f64), Some(3.0));
        assert_eq!(json.get("y").and_then(serde_json::Value::as_f64), Some(4.0));
        assert_eq!(
            json.get("distanceTravelled").and_then(serde_json::Value::as_f64),
            Some(7.0)
        );
    }
}
