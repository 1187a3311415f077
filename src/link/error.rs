//! Transport-level errors shared by all device links.

use thiserror::Error;

/// Failure while carrying a command to the rover or waiting for its
/// response. Converted into [`crate::error::GatewayError`] at the
/// service boundary.
#[derive(Debug, Error)]
pub enum LinkError {
    /// HTTP transport failure.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket transport failure.
    #[error("websocket transport error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// MQTT client failure.
    #[error("mqtt client error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// The configured endpoint could not be parsed.
    #[error("invalid device endpoint: {0}")]
    InvalidEndpoint(String),

    /// Command or response (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transport could not be brought up.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A command was issued on a link with no live connection.
    #[error("not connected")]
    NotConnected,

    /// The rover did not answer within the response timeout.
    #[error("timed out waiting for device response to '{command}'")]
    Timeout {
        /// Command that went unanswered.
        command: String,
    },

    /// The connection dropped while a response was pending.
    #[error("response channel closed")]
    ChannelClosed,
}
