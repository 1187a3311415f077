//! Movement direction vocabulary shared by the REST API, the device
//! wire protocol, and the odometry tracker.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a movement command.
///
/// `Forward`/`Backward` translate the platform along its heading;
/// `Left`/`Right` rotate it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Drive along the current heading.
    Forward,
    /// Drive against the current heading.
    Backward,
    /// Rotate counter-clockwise.
    Left,
    /// Rotate clockwise.
    Right,
}

impl Direction {
    /// Returns the lowercase wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Returns `true` for the rotating directions.
    #[must_use]
    pub const fn is_turn(&self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_is_lowercase() {
        let json = serde_json::to_string(&Direction::Forward).ok();
        assert_eq!(json.as_deref(), Some("\"forward\""));

        let parsed: Option<Direction> = serde_json::from_str("\"left\"").ok();
        assert_eq!(parsed, Some(Direction::Left));
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let parsed: Result<Direction, _> = serde_json::from_str("\"sideways\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn turns_are_turns() {
        assert!(Direction::Left.is_turn());
        assert!(Direction::Right.is_turn());
        assert!(!Direction::Forward.is_turn());
        assert!(!Direction::Backward.is_turn());
    }
}
