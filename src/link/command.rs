//! Wire commands sent to the rover.
//!
//! Over WebSocket and MQTT the rover accepts one JSON shape:
//! `{"command": "...", "direction"?, "speed"?, "angle"?, "id"?}`.
//! The `id` is a correlation token echoed back in the response.

use serde::Serialize;

use crate::domain::Direction;

/// Command discriminator, lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// Start moving.
    Move,
    /// Stop all motors.
    Stop,
    /// Report runtime status.
    Status,
    /// Report static device information.
    Info,
}

impl CommandKind {
    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Stop => "stop",
            Self::Status => "status",
            Self::Info => "info",
        }
    }
}

/// One command envelope for the WebSocket and MQTT transports.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceCommand {
    /// Command discriminator.
    pub command: CommandKind,
    /// Movement direction, move commands only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Motor speed 0–255, move commands only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u8>,
    /// Optional target heading in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    /// Correlation id, filled in by the link right before sending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl DeviceCommand {
    /// Builds a move command.
    #[must_use]
    pub fn movement(direction: Direction, speed: u8, angle: Option<f64>) -> Self {
        Self {
            command: CommandKind::Move,
            direction: Some(direction),
            speed: Some(speed),
            angle,
            id: None,
        }
    }

    /// Builds a stop command.
    #[must_use]
    pub fn stop() -> Self {
        Self::bare(CommandKind::Stop)
    }

    /// Builds a status query.
    #[must_use]
    pub fn status() -> Self {
        Self::bare(CommandKind::Status)
    }

    /// Builds an info query.
    #[must_use]
    pub fn info() -> Self {
        Self::bare(CommandKind::Info)
    }

    /// Returns the same command with the correlation id set.
    #[must_use]
    pub fn with_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }

    fn bare(command: CommandKind) -> Self {
        Self {
            command,
            direction: None,
            speed: None,
            angle: None,
            id: None,
        }
    }
}
