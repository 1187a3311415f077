//! HTTP device link.
//!
//! The rover's firmware runs a small HTTP server with one route per
//! command, so this transport has no connection lifecycle at all:
//! `POST /move`, `GET /stop`, `GET /status`, and `GET /` for info.

use async_trait::async_trait;
use serde::Serialize;

use super::device::{DeviceInfo, DeviceResponse, DeviceStatus};
use super::error::LinkError;
use super::{DeviceLink, Protocol};
use crate::domain::Direction;

/// Request body for `POST {base}/move`. The HTTP transport does not use
/// the command envelope; the route already names the command.
#[derive(Debug, Serialize)]
struct MoveBody {
    direction: Direction,
    speed: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    angle: Option<f64>,
}

/// Stateless HTTP transport to the rover.
#[derive(Debug, Clone)]
pub struct HttpLink {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLink {
    /// Creates a link against the given base URL, e.g.
    /// `http://192.168.0.70`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, LinkError> {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DeviceLink for HttpLink {
    fn protocol(&self) -> Protocol {
        Protocol::Http
    }

    async fn connect(&self) -> Result<(), LinkError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        true
    }

    async fn send_move(
        &self,
        direction: Direction,
        speed: u8,
        angle: Option<f64>,
    ) -> Result<DeviceResponse, LinkError> {
        let url = format!("{}/move", self.base_url);
        let body = MoveBody {
            direction,
            speed,
            angle,
        };
        tracing::debug!(%url, %direction, speed, "sending move over http");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn send_stop(&self) -> Result<DeviceResponse, LinkError> {
        self.get_json("/stop").await
    }

    async fn status(&self) -> Result<DeviceStatus, LinkError> {
        self.get_json("/status").await
    }

    async fn info(&self) -> Result<DeviceInfo, LinkError> {
        self.get_json("/").await
    }
}
