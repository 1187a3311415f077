//! MQTT device link.
//!
//! Commands are published to a command topic and responses arrive on a
//! response topic, correlated by `id`. The firmware occasionally drops
//! the id from a response; those complete the oldest pending request.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::command::DeviceCommand;
use super::device::{DeviceInfo, DeviceResponse, DeviceStatus};
use super::error::LinkError;
use super::pending::{PendingRequests, correlation_id};
use super::{DeviceLink, Protocol};
use crate::domain::Direction;

/// How long to wait for the broker's CONNACK.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause before the event loop retries after a broker error.
const RECONNECT_PAUSE: Duration = Duration::from_secs(5);

/// MQTT link configuration.
#[derive(Debug, Clone)]
pub struct MqttLinkConfig {
    /// Broker URL (`mqtt://host:port`).
    pub broker_url: String,
    /// Client id prefix; a UUID is appended per connection so stale
    /// sessions on the broker never collide.
    pub client_id_prefix: String,
    /// Topic commands are published to.
    pub command_topic: String,
    /// Topic responses arrive on.
    pub response_topic: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u64,
    /// How long to wait for a response before giving up.
    pub response_timeout: Duration,
}

impl Default for MqttLinkConfig {
    fn default() -> Self {
        Self {
            broker_url: "mqtt://broker.mqtt.cool:1883".to_string(),
            client_id_prefix: "rover-gateway".to_string(),
            command_topic: "esp32/command".to_string(),
            response_topic: "esp32/response".to_string(),
            keep_alive_secs: 20,
            response_timeout: Duration::from_secs(5),
        }
    }
}

struct LinkState {
    client: AsyncClient,
    event_task: JoinHandle<()>,
}

/// MQTT transport to the rover through a broker.
pub struct MqttLink {
    config: MqttLinkConfig,
    pending: Arc<PendingRequests>,
    connected: Arc<AtomicBool>,
    state: Mutex<Option<LinkState>>,
}

impl MqttLink {
    /// Creates a link with the given configuration. No connection is
    /// made until the first command (or an explicit
    /// [`DeviceLink::connect`]).
    #[must_use]
    pub fn new(config: MqttLinkConfig) -> Self {
        Self {
            config,
            pending: Arc::new(PendingRequests::new()),
            connected: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(None),
        }
    }

    async fn request<T: DeserializeOwned>(&self, command: DeviceCommand) -> Result<T, LinkError> {
        if !self.is_connected().await {
            self.connect().await?;
        }

        let kind = command.command;
        let (id, rx) = self.pending.register().await;
        let command = command.with_id(id.clone());
        let json = serde_json::to_string(&command)?;

        {
            let state = self.state.lock().await;
            let Some(state) = state.as_ref() else {
                self.pending.remove(&id).await;
                return Err(LinkError::NotConnected);
            };
            if let Err(err) = state
                .client
                .publish(&self.config.command_topic, QoS::AtLeastOnce, false, json)
                .await
            {
                self.pending.remove(&id).await;
                return Err(LinkError::Mqtt(err));
            }
        }
        tracing::debug!(%id, command = kind.as_str(), topic = %self.config.command_topic, "mqtt command published");

        match tokio::time::timeout(self.config.response_timeout, rx).await {
            Ok(Ok(payload)) => Ok(serde_json::from_str(&payload)?),
            Ok(Err(_)) => Err(LinkError::ChannelClosed),
            Err(_) => {
                self.pending.remove(&id).await;
                Err(LinkError::Timeout {
                    command: kind.as_str().to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl DeviceLink for MqttLink {
    fn protocol(&self) -> Protocol {
        Protocol::Mqtt
    }

    async fn connect(&self) -> Result<(), LinkError> {
        let mut state = self.state.lock().await;
        if state.is_some() && self.connected.load(Ordering::Relaxed) {
            return Ok(());
        }
        if let Some(old) = state.take() {
            old.event_task.abort();
        }

        let (host, port) = broker_host_port(&self.config.broker_url)?;
        let client_id = format!("{}-{}", self.config.client_id_prefix, uuid::Uuid::new_v4());

        let mut options = MqttOptions::new(&client_id, host, port);
        options.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs));
        options.set_clean_session(true);

        let (client, mut eventloop) = AsyncClient::new(options, 100);

        tracing::info!(broker = %self.config.broker_url, %client_id, "connecting to mqtt broker");

        // Drive the event loop inline until the broker acknowledges the
        // session, so a caller returning from connect() can publish.
        let connack = tokio::time::timeout(CONNECT_TIMEOUT, async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => break Ok(()),
                    Ok(_) => {}
                    Err(err) => break Err(err),
                }
            }
        })
        .await;
        match connack {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(LinkError::ConnectionFailed(err.to_string())),
            Err(_) => {
                return Err(LinkError::ConnectionFailed(format!(
                    "no CONNACK from {} within {CONNECT_TIMEOUT:?}",
                    self.config.broker_url
                )));
            }
        }

        client
            .subscribe(&self.config.response_topic, QoS::AtLeastOnce)
            .await?;
        tracing::info!(topic = %self.config.response_topic, "subscribed to response topic");

        self.connected.store(true, Ordering::Relaxed);
        let event_task = tokio::spawn(event_loop_task(
            eventloop,
            self.config.response_topic.clone(),
            Arc::clone(&self.pending),
            Arc::clone(&self.connected),
        ));
        *state = Some(LinkState { client, event_task });

        Ok(())
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        let mut state = self.state.lock().await;
        if let Some(link_state) = state.take() {
            let _ = link_state.client.disconnect().await;
            link_state.event_task.abort();
        }
        self.connected.store(false, Ordering::Relaxed);
        self.pending.fail_all().await;
        tracing::info!(broker = %self.config.broker_url, "mqtt link disconnected");
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn send_move(
        &self,
        direction: Direction,
        speed: u8,
        angle: Option<f64>,
    ) -> Result<DeviceResponse, LinkError> {
        self.request(DeviceCommand::movement(direction, speed, angle))
            .await
    }

    async fn send_stop(&self) -> Result<DeviceResponse, LinkError> {
        self.request(DeviceCommand::stop()).await
    }

    async fn status(&self) -> Result<DeviceStatus, LinkError> {
        self.request(DeviceCommand::status()).await
    }

    async fn info(&self) -> Result<DeviceInfo, LinkError> {
        self.request(DeviceCommand::info()).await
    }
}

impl fmt::Debug for MqttLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttLink")
            .field("broker_url", &self.config.broker_url)
            .field("connected", &self.connected.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Drives the rumqttc event loop, routing publishes on the response
/// topic into the pending-request map. rumqttc reconnects on its own;
/// this task just keeps polling with a pause after errors.
async fn event_loop_task(
    mut eventloop: EventLoop,
    response_topic: String,
    pending: Arc<PendingRequests>,
    connected: Arc<AtomicBool>,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if publish.topic == response_topic {
                    let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                    dispatch_response(&pending, payload).await;
                } else {
                    tracing::debug!(topic = %publish.topic, "ignoring publish on unrelated topic");
                }
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                connected.store(true, Ordering::Relaxed);
                tracing::info!("mqtt session re-established");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!(error = %err, "mqtt connection error");
                connected.store(false, Ordering::Relaxed);
                pending.fail_all().await;
                tokio::time::sleep(RECONNECT_PAUSE).await;
            }
        }
    }
}

/// Routes one response payload: by id when present, otherwise to the
/// oldest pending request (some firmware replies drop the id).
async fn dispatch_response(pending: &PendingRequests, payload: String) {
    tracing::debug!(%payload, "mqtt response received");
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&payload) else {
        tracing::warn!("unparseable device response: {payload}");
        return;
    };
    match correlation_id(&value) {
        Some(id) => {
            if !pending.complete(&id, payload).await {
                tracing::warn!(%id, "no pending request for response id");
            }
        }
        None => match pending.complete_oldest(payload).await {
            Some(id) => {
                tracing::warn!(%id, "response without id; completed oldest pending request");
            }
            None => tracing::warn!("response without id and nothing pending"),
        },
    }
}

/// Splits a broker URL into host and port (default 1883).
fn broker_host_port(broker_url: &str) -> Result<(String, u16), LinkError> {
    let url = url::Url::parse(broker_url)
        .map_err(|e| LinkError::InvalidEndpoint(format!("{broker_url}: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| LinkError::InvalidEndpoint(format!("{broker_url}: missing host")))?
        .to_string();
    let port = url.port().unwrap_or(1883);
    Ok((host, port))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_the_fleet() {
        let config = MqttLinkConfig::default();
        assert_eq!(config.command_topic, "esp32/command");
        assert_eq!(config.response_topic, "esp32/response");
        assert_eq!(config.keep_alive_secs, 20);
        assert_eq!(config.response_timeout, Duration::from_secs(5));
    }

    #[test]
    fn broker_url_parses_host_and_port() {
        let Ok((host, port)) = broker_host_port("mqtt://broker.mqtt.cool:1883") else {
            panic!("expected parse to succeed");
        };
        assert_eq!(host, "broker.mqtt.cool");
        assert_eq!(port, 1883);
    }

    #[test]
    fn broker_url_defaults_port() {
        let Ok((_, port)) = broker_host_port("mqtt://localhost") else {
            panic!("expected parse to succeed");
        };
        assert_eq!(port, 1883);
    }

    #[test]
    fn bad_broker_url_is_rejected() {
        assert!(matches!(
            broker_host_port("not a url"),
            Err(LinkError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn response_with_id_completes_matching_request() {
        let pending = PendingRequests::new();
        let (id, rx) = pending.register().await;

        let payload = format!(r#"{{"status": "ok", "id": "{id}"}}"#);
        dispatch_response(&pending, payload).await;

        let Ok(received) = rx.await else {
            panic!("expected completed request");
        };
        assert!(received.contains("ok"));
    }

    #[tokio::test]
    async fn response_without_id_completes_oldest() {
        let pending = PendingRequests::new();
        let (_first, rx_first) = pending.register().await;
        let (_second, rx_second) = pending.register().await;

        dispatch_response(&pending, r#"{"status": "ok"}"#.to_string()).await;

        assert!(rx_first.await.is_ok());
        // The newer request is still pending.
        assert_eq!(pending.len().await, 1);
        drop(rx_second);
    }

    #[tokio::test]
    async fn garbage_payload_completes_nothing() {
        let pending = PendingRequests::new();
        let (_id, _rx) = pending.register().await;
        dispatch_response(&pending, "not json".to_string()).await;
        assert_eq!(pending.len().await, 1);
    }
}
