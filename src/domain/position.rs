//! Planar position of the rover platform.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cartesian position of the platform in metres from the origin.
///
/// The origin is wherever the platform was when the gateway started
/// (or was last reset). The X axis points along the initial heading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Position {
    /// Distance along the X axis in metres.
    pub x: f64,
    /// Distance along the Y axis in metres.
    pub y: f64,
}

impl Position {
    /// The origin `(0, 0)`.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a position from explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.x, self.y)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_zero() {
        assert_eq!(Position::ORIGIN, Position::new(0.0, 0.0));
    }

    #[test]
    fn serde_round_trip() {
        let pos = Position::new(1.25, -0.5);
        let json = serde_json::to_string(&pos).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        let back: Option<Position> = serde_json::from_str(&json).ok();
        assert_eq!(back, Some(pos));
    }
}
