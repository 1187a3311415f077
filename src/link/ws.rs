//! WebSocket device link.
//!
//! Keeps one persistent connection to the rover's WebSocket endpoint.
//! Commands go out with a correlation `id`; a background reader task
//! completes the matching pending request when the response comes back.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::command::DeviceCommand;
use super::device::{DeviceInfo, DeviceResponse, DeviceStatus};
use super::error::LinkError;
use super::pending::{PendingRequests, correlation_id};
use super::{DeviceLink, Protocol};
use crate::domain::Direction;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

struct LinkState {
    writer: WsSink,
    reader_task: JoinHandle<()>,
}

/// Persistent WebSocket transport to the rover.
pub struct WsLink {
    url: String,
    timeout: Duration,
    pending: Arc<PendingRequests>,
    connected: Arc<AtomicBool>,
    state: Mutex<Option<LinkState>>,
}

impl WsLink {
    /// Creates a link against the given endpoint, e.g.
    /// `ws://192.168.0.70:81`. No connection is made until the first
    /// command (or an explicit [`DeviceLink::connect`]).
    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
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
            let mut state = self.state.lock().await;
            let Some(state) = state.as_mut() else {
                self.pending.remove(&id).await;
                return Err(LinkError::NotConnected);
            };
            if let Err(err) = state.writer.send(Message::Text(json.into())).await {
                self.pending.remove(&id).await;
                self.connected.store(false, Ordering::Relaxed);
                return Err(LinkError::WebSocket(err));
            }
        }
        tracing::debug!(%id, command = kind.as_str(), "websocket command sent");

        match tokio::time::timeout(self.timeout, rx).await {
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
impl DeviceLink for WsLink {
    fn protocol(&self) -> Protocol {
        Protocol::WebSocket
    }

    async fn connect(&self) -> Result<(), LinkError> {
        let mut state = self.state.lock().await;
        if state.is_some() && self.connected.load(Ordering::Relaxed) {
            return Ok(());
        }
        // Drop any stale half-open state before reconnecting.
        if let Some(old) = state.take() {
            old.reader_task.abort();
        }

        let (stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| LinkError::ConnectionFailed(e.to_string()))?;
        let (writer, reader) = stream.split();

        self.connected.store(true, Ordering::Relaxed);
        let reader_task = tokio::spawn(read_loop(
            reader,
            Arc::clone(&self.pending),
            Arc::clone(&self.connected),
        ));
        *state = Some(LinkState {
            writer,
            reader_task,
        });

        tracing::info!(url = %self.url, "websocket link connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        let mut state = self.state.lock().await;
        if let Some(mut link_state) = state.take() {
            let _ = link_state.writer.send(Message::Close(None)).await;
            link_state.reader_task.abort();
        }
        self.connected.store(false, Ordering::Relaxed);
        self.pending.fail_all().await;
        tracing::info!(url = %self.url, "websocket link disconnected");
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

impl fmt::Debug for WsLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsLink")
            .field("url", &self.url)
            .field("connected", &self.connected.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Reads frames until the connection drops, routing responses to their
/// pending requests.
async fn read_loop(
    mut reader: WsSource,
    pending: Arc<PendingRequests>,
    connected: Arc<AtomicBool>,
) {
    while let Some(msg) = reader.next().await {
        match msg {
            Ok(Message::Text(text)) => dispatch_response(&pending, text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "websocket link transport error");
                break;
            }
        }
    }
    connected.store(false, Ordering::Relaxed);
    pending.fail_all().await;
    tracing::debug!("websocket link reader stopped");
}

async fn dispatch_response(pending: &PendingRequests, text: &str) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        tracing::warn!("unparseable device response: {text}");
        return;
    };
    match correlation_id(&value) {
        Some(id) => {
            if !pending.complete(&id, text.to_string()).await {
                tracing::warn!(%id, "no pending request for response id");
            }
        }
        None => tracing::warn!("device response without id: {text}"),
    }
}
