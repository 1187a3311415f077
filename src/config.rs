//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Defaults match the rover fleet's
//! factory settings.

use std::net::SocketAddr;

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`RoverConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RoverConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Base URL of the rover's embedded HTTP server.
    pub device_http_url: String,

    /// URL of the rover's WebSocket endpoint.
    pub device_ws_url: String,

    /// MQTT broker URL.
    pub mqtt_broker_url: String,

    /// Prefix for the MQTT client id; a UUID is appended per connection.
    pub mqtt_client_id_prefix: String,

    /// Topic commands are published to.
    pub mqtt_command_topic: String,

    /// Topic responses arrive on.
    pub mqtt_response_topic: String,

    /// MQTT keep-alive interval in seconds.
    pub mqtt_keep_alive_secs: u64,

    /// Seconds to wait for a device response before giving up.
    pub device_timeout_secs: u64,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,
}

impl RoverConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let device_http_url = std::env::var("DEVICE_HTTP_URL")
            .unwrap_or_else(|_| "http://192.168.0.70".to_string());
        let device_ws_url =
            std::env::var("DEVICE_WS_URL").unwrap_or_else(|_| "ws://192.168.0.70:81".to_string());

        let mqtt_broker_url = std::env::var("MQTT_BROKER_URL")
            .unwrap_or_else(|_| "mqtt://broker.mqtt.cool:1883".to_string());
        let mqtt_client_id_prefix = std::env::var("MQTT_CLIENT_ID_PREFIX")
            .unwrap_or_else(|_| "rover-gateway".to_string());
        let mqtt_command_topic =
            std::env::var("MQTT_COMMAND_TOPIC").unwrap_or_else(|_| "esp32/command".to_string());
        let mqtt_response_topic =
            std::env::var("MQTT_RESPONSE_TOPIC").unwrap_or_else(|_| "esp32/response".to_string());

        let mqtt_keep_alive_secs = parse_env("MQTT_KEEP_ALIVE_SECS", 20);
        let device_timeout_secs = parse_env("DEVICE_TIMEOUT_SECS", 5);
        let event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", 10_000);

        Ok(Self {
            listen_addr,
            device_http_url,
            device_ws_url,
            mqtt_broker_url,
            mqtt_client_id_prefix,
            mqtt_command_topic,
            mqtt_response_topic,
            mqtt_keep_alive_secs,
            device_timeout_secs,
            event_bus_capacity,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
