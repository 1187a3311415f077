//! Device link layer: transports carrying commands to the rover.
//!
//! The rover accepts the same JSON command set over three transports —
//! plain HTTP, a WebSocket endpoint, and an MQTT broker. Each transport
//! implements [`DeviceLink`]; the service layer switches between them
//! per request.

pub mod command;
pub mod device;
pub mod error;
pub mod http;
pub mod mqtt;
pub mod pending;
pub mod ws;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use command::{CommandKind, DeviceCommand};
pub use device::{DeviceCapabilities, DeviceInfo, DeviceResponse, DeviceStatus};
pub use error::LinkError;
pub use http::HttpLink;
pub use mqtt::{MqttLink, MqttLinkConfig};
pub use pending::PendingRequests;
pub use ws::WsLink;

use crate::domain::Direction;

/// Transport used to reach the rover.
///
/// Serialized uppercase, matching what the dashboard sends in move
/// requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    /// Request/response over the rover's embedded HTTP server.
    Http,
    /// Persistent WebSocket connection to the rover.
    WebSocket,
    /// Publish/subscribe through an MQTT broker.
    Mqtt,
}

impl Protocol {
    /// Returns the uppercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "HTTP",
            Self::WebSocket => "WEBSOCKET",
            Self::Mqtt => "MQTT",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transport adapter for the rover's command protocol.
///
/// Implementations are cheap to share (`Arc<dyn DeviceLink>`) and keep
/// their own connection state internally; callers only see the command
/// surface. `connect` is idempotent and `disconnect` fails any requests
/// still waiting for a response.
#[async_trait]
pub trait DeviceLink: Send + Sync + fmt::Debug {
    /// The transport this link speaks.
    fn protocol(&self) -> Protocol;

    /// Establishes the underlying connection. A no-op when already
    /// connected (and always for HTTP).
    ///
    /// # Errors
    ///
    /// Returns a [`LinkError`] when the transport cannot be brought up.
    async fn connect(&self) -> Result<(), LinkError>;

    /// Tears down the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns a [`LinkError`] when the teardown itself fails; the link
    /// is considered disconnected regardless.
    async fn disconnect(&self) -> Result<(), LinkError>;

    /// Returns `true` when the link can carry a command right now.
    async fn is_connected(&self) -> bool;

    /// Sends a move command and waits for the rover's acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns a [`LinkError`] on transport failure or response timeout.
    async fn send_move(
        &self,
        direction: Direction,
        speed: u8,
        angle: Option<f64>,
    ) -> Result<DeviceResponse, LinkError>;

    /// Sends a stop command.
    ///
    /// # Errors
    ///
    /// Returns a [`LinkError`] on transport failure or response timeout.
    async fn send_stop(&self) -> Result<DeviceResponse, LinkError>;

    /// Queries the rover's runtime status.
    ///
    /// # Errors
    ///
    /// Returns a [`LinkError`] on transport failure or response timeout.
    async fn status(&self) -> Result<DeviceStatus, LinkError>;

    /// Queries the rover's static information.
    ///
    /// # Errors
    ///
    /// Returns a [`LinkError`] on transport failure or response timeout.
    async fn info(&self) -> Result<DeviceInfo, LinkError>;
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn protocol_wire_format_is_uppercase() {
        let json = serde_json::to_string(&Protocol::WebSocket).ok();
        assert_eq!(json.as_deref(), Some("\"WEBSOCKET\""));

        let parsed: Option<Protocol> = serde_json::from_str("\"MQTT\"").ok();
        assert_eq!(parsed, Some(Protocol::Mqtt));
    }

    #[test]
    fn lowercase_protocol_is_rejected() {
        let parsed: Result<Protocol, _> = serde_json::from_str("\"http\"");
        assert!(parsed.is_err());
    }
}
