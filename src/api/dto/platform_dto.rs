//! Platform command response DTO.

use serde::Serialize;

use crate::domain::{Direction, PoseSnapshot, Position};

/// Response body for move, stop, and reset operations.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformResponse {
    /// `"success"` for completed commands.
    pub status: String,
    /// Estimated position after the command.
    pub position: Position,
    /// Direction the command drove, move responses only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Heading in degrees after the command.
    pub angle: f64,
    /// Cumulative distance travelled in metres.
    pub distance_travelled: f64,
}

impl PlatformResponse {
    /// Builds a response from a pose, optionally echoing the direction.
    #[must_use]
    pub fn from_pose(pose: PoseSnapshot, direction: Option<Direction>) -> Self {
        Self {
            status: "success".to_string(),
            position: pose.position,
            direction,
            angle: pose.angle_deg,
            distance_travelled: pose.total_distance,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_is_camel_case() {
        let pose = PoseSnapshot {
            position: Position::new(1.0, 0.5),
            angle_deg: 15.0,
            total_distance: 2.5,
        };
        let json = serde_json::to_value(PlatformResponse::from_pose(pose, Some(Direction::Forward)))
            .ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("success"));
        assert_eq!(json.get("direction").and_then(|v| v.as_str()), Some("forward"));
        assert!(json.get("distanceTravelled").is_some());
        assert!(json.get("distance_travelled").is_none());
    }

    #[test]
    fn direction_is_omitted_when_absent() {
        let pose = PoseSnapshot {
            position: Position::ORIGIN,
            angle_deg: 0.0,
            total_distance: 0.0,
        };
        let json = serde_json::to_value(PlatformResponse::from_pose(pose, None)).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert!(json.get("direction").is_none());
    }
}
