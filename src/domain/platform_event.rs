//! Broadcast events reflecting platform state changes.
//!
//! Every executed command publishes a [`PlatformEvent`] through the
//! [`super::EventBus`]; WebSocket connections forward them to browser
//! clients filtered by [`Topic`]. The serialized shape matches what the
//! rover dashboard already consumes: a `type` discriminator in
//! `SCREAMING_SNAKE_CASE`, camelCase fields, and epoch-millisecond
//! timestamps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::position::Position;

/// Broadcast channel class a client can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Position, status, and configuration updates.
    Updates,
    /// Protocol lifecycle messages (switching, connected).
    Status,
    /// Communication and device failures.
    Errors,
}

impl Topic {
    /// Every topic, for wildcard subscriptions.
    pub const ALL: [Self; 3] = [Self::Updates, Self::Status, Self::Errors];

    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Updates => "updates",
            Self::Status => "status",
            Self::Errors => "errors",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "updates" => Ok(Self::Updates),
            "status" => Ok(Self::Status),
            "errors" => Ok(Self::Errors),
            _ => Err(()),
        }
    }
}

/// Discriminator carried in the serialized `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateKind {
    /// The estimated pose changed (move or stop).
    PositionUpdate,
    /// A status report or a protocol lifecycle message.
    StatusUpdate,
    /// Gateway configuration changed.
    ConfigUpdate,
    /// Something failed.
    Error,
}

/// A single broadcast update.
///
/// One struct with optional fields rather than a variant per shape:
/// this is the exact union the dashboard wire format uses, and the
/// constructors below are the only ways to build one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformEvent {
    /// Update discriminator.
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    /// Broadcast topic; not part of the payload.
    #[serde(skip)]
    pub topic: Topic,
    /// Estimated position, when relevant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Heading in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    /// Commanded or reported speed (0–255).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<i32>,
    /// Direction string (`"forward"`, …, or `"stop"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// Whether the platform is currently moving.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_moving: Option<bool>,
    /// Cumulative distance travelled in metres.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_traveled: Option<f64>,
    /// Human-readable message for status/config/error updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl PlatformEvent {
    fn base(kind: UpdateKind, topic: Topic) -> Self {
        Self {
            kind,
            topic,
            position: None,
            angle: None,
            speed: None,
            direction: None,
            is_moving: None,
            distance_traveled: None,
            message: None,
            timestamp: now_millis(),
        }
    }

    /// Pose update after a successful move command.
    #[must_use]
    pub fn position_update(
        position: Position,
        angle: f64,
        direction: &str,
        speed: u8,
        distance_traveled: f64,
    ) -> Self {
        Self {
            position: Some(position),
            angle: Some(angle),
            speed: Some(i32::from(speed)),
            direction: Some(direction.to_string()),
            is_moving: Some(true),
            distance_traveled: Some(distance_traveled),
            ..Self::base(UpdateKind::PositionUpdate, Topic::Updates)
        }
    }

    /// Pose update after a stop command.
    #[must_use]
    pub fn stop_update(position: Position, angle: f64, distance_traveled: f64) -> Self {
        Self {
            position: Some(position),
            angle: Some(angle),
            speed: Some(0),
            direction: Some("stop".to_string()),
            is_moving: Some(false),
            distance_traveled: Some(distance_traveled),
            ..Self::base(UpdateKind::PositionUpdate, Topic::Updates)
        }
    }

    /// Device status report forwarded to the dashboard.
    #[must_use]
    pub fn status_report(
        position: Position,
        angle: f64,
        speed: Option<i32>,
        direction: Option<String>,
        is_moving: Option<bool>,
    ) -> Self {
        Self {
            position: Some(position),
            angle: Some(angle),
            speed,
            direction,
            is_moving,
            ..Self::base(UpdateKind::StatusUpdate, Topic::Updates)
        }
    }

    /// Protocol lifecycle message (published on the `status` topic).
    #[must_use]
    pub fn status_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::base(UpdateKind::StatusUpdate, Topic::Status)
        }
    }

    /// Configuration change notice.
    #[must_use]
    pub fn config_update(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::base(UpdateKind::ConfigUpdate, Topic::Updates)
        }
    }

    /// Failure notice (published on the `errors` topic).
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::base(UpdateKind::Error, Topic::Errors)
        }
    }

    /// Returns the topic this event is broadcast on.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        self.topic
    }
}

/// Current time as epoch milliseconds, the dashboard timestamp format.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn position_update_wire_shape() {
        let event =
            PlatformEvent::position_update(Position::new(1.0, 2.0), 45.0, "forward", 100, 3.5);
        let json = serde_json::to_value(&event).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };

        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some("POSITION_UPDATE"));
        assert_eq!(json.get("direction").and_then(|v| v.as_str()), Some("forward"));
        assert_eq!(json.get("isMoving").and_then(serde_json::Value::as_bool), Some(true));
        assert_eq!(
            json.get("distanceTraveled").and_then(serde_json::Value::as_f64),
            Some(3.5)
        );
        // Topic is routing metadata, not payload.
        assert!(json.get("topic").is_none());
        // Absent fields are omitted entirely.
        assert!(json.get("message").is_none());
    }

    #[test]
    fn stop_update_marks_not_moving() {
        let event = PlatformEvent::stop_update(Position::ORIGIN, 0.0, 1.0);
        assert_eq!(event.direction.as_deref(), Some("stop"));
        assert_eq!(event.speed, Some(0));
        assert_eq!(event.is_moving, Some(false));
        assert_eq!(event.topic(), Topic::Updates);
    }

    #[test]
    fn message_events_route_to_their_topics() {
        assert_eq!(
            PlatformEvent::status_message("Switching to MQTT protocol").topic(),
            Topic::Status
        );
        assert_eq!(PlatformEvent::config_update("radius").topic(), Topic::Updates);
        assert_eq!(PlatformEvent::error("boom").topic(), Topic::Errors);
    }

    #[test]
    fn error_event_wire_shape() {
        let event = PlatformEvent::error("ESP32 error: stalled");
        let json = serde_json::to_value(&event).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some("ERROR"));
        assert_eq!(
            json.get("message").and_then(|v| v.as_str()),
            Some("ESP32 error: stalled")
        );
        assert!(json.get("position").is_none());
    }

    #[test]
    fn topic_parses_from_wire_names() {
        assert_eq!("updates".parse(), Ok(Topic::Updates));
        assert_eq!("errors".parse(), Ok(Topic::Errors));
        assert!("anything-else".parse::<Topic>().is_err());
    }
}
