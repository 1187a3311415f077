//! Platform service: orchestrates rover commands and emits events.

use std::f64::consts::PI;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use crate::config::RoverConfig;
use crate::domain::platform_event::now_millis;
use crate::domain::{
    Direction, EventBus, MovementLog, MovementRecord, Odometry, PlatformEvent, PoseSnapshot,
};
use crate::error::GatewayError;
use crate::link::{
    DeviceInfo, DeviceLink, DeviceStatus, HttpLink, MqttLink, MqttLinkConfig, Protocol, WsLink,
};

/// The three transports the gateway can reach the rover over.
#[derive(Debug, Clone)]
pub struct LinkSet {
    /// HTTP transport.
    pub http: Arc<dyn DeviceLink>,
    /// WebSocket transport.
    pub ws: Arc<dyn DeviceLink>,
    /// MQTT transport.
    pub mqtt: Arc<dyn DeviceLink>,
}

impl LinkSet {
    /// Builds the production links from gateway configuration.
    #[must_use]
    pub fn from_config(config: &RoverConfig) -> Self {
        let timeout = Duration::from_secs(config.device_timeout_secs);
        Self {
            http: Arc::new(HttpLink::new(config.device_http_url.clone())),
            ws: Arc::new(WsLink::new(config.device_ws_url.clone(), timeout)),
            mqtt: Arc::new(MqttLink::new(MqttLinkConfig {
                broker_url: config.mqtt_broker_url.clone(),
                client_id_prefix: config.mqtt_client_id_prefix.clone(),
                command_topic: config.mqtt_command_topic.clone(),
                response_topic: config.mqtt_response_topic.clone(),
                keep_alive_secs: config.mqtt_keep_alive_secs,
                response_timeout: timeout,
            })),
        }
    }

    fn get(&self, protocol: Protocol) -> Arc<dyn DeviceLink> {
        match protocol {
            Protocol::Http => Arc::clone(&self.http),
            Protocol::WebSocket => Arc::clone(&self.ws),
            Protocol::Mqtt => Arc::clone(&self.mqtt),
        }
    }
}

/// Pose state plus the wall-clock anchor for dead reckoning.
#[derive(Debug)]
struct MotionState {
    odometry: Odometry,
    last_movement: Instant,
}

/// Orchestration layer for all rover operations.
///
/// Owns the device links, the active-protocol selector, the odometry
/// tracker, the movement log, and the [`EventBus`]. Every command
/// follows the pattern: switch protocol if requested → send over the
/// active link → update state → emit events → return result.
#[derive(Debug)]
pub struct PlatformService {
    links: LinkSet,
    active: RwLock<Protocol>,
    motion: Mutex<MotionState>,
    history: MovementLog,
    event_bus: EventBus,
}

impl PlatformService {
    /// Creates a new `PlatformService`. HTTP starts as the active
    /// protocol; the other links connect lazily on first use.
    #[must_use]
    pub fn new(links: LinkSet, event_bus: EventBus) -> Self {
        Self {
            links,
            active: RwLock::new(Protocol::Http),
            motion: Mutex::new(MotionState {
                odometry: Odometry::new(),
                last_movement: Instant::now(),
            }),
            history: MovementLog::new(),
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns the currently active protocol.
    pub async fn active_protocol(&self) -> Protocol {
        *self.active.read().await
    }

    /// Sends a move command over the requested protocol, advances the
    /// estimated pose, logs the move, and broadcasts the new pose.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when the protocol switch fails, the
    /// transport fails, or the rover reports an error.
    pub async fn move_platform(
        &self,
        protocol: Protocol,
        direction: Direction,
        speed: u8,
        angle: Option<f64>,
    ) -> Result<PoseSnapshot, GatewayError> {
        self.switch_protocol_if_needed(protocol).await?;

        let link = self.active_link().await;
        let response = match link.send_move(direction, speed, angle).await {
            Ok(response) => response,
            Err(err) => {
                self.event_bus
                    .publish(PlatformEvent::error(format!("Failed to communicate: {err}")));
                return Err(err.into());
            }
        };
        if !response.is_ok() {
            let message = response.error_message();
            self.event_bus
                .publish(PlatformEvent::error(format!("ESP32 error: {message}")));
            return Err(GatewayError::DeviceError(message));
        }

        // A heading measured by the firmware wins over the requested one.
        let angle_override = response.angle.or(angle);
        let pose = {
            let mut motion = self.motion.lock().await;
            let now = Instant::now();
            let dt = now.duration_since(motion.last_movement).as_secs_f64();
            motion.last_movement = now;
            motion.odometry.advance(direction, speed, angle_override, dt);
            motion.odometry.snapshot()
        };

        self.event_bus.publish(PlatformEvent::position_update(
            pose.position,
            pose.angle_deg,
            direction.as_str(),
            speed,
            pose.total_distance,
        ));

        self.history
            .push(MovementRecord {
                direction,
                speed,
                timestamp: now_millis(),
                position: pose.position,
                angle: pose.angle_deg,
                distance_travelled: pose.total_distance,
            })
            .await;

        tracing::info!(%direction, speed, %protocol, "move executed");
        Ok(pose)
    }

    /// Sends a stop command over the active protocol and broadcasts a
    /// stationary pose update.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on transport failure or a rover-side
    /// error.
    pub async fn stop_platform(&self) -> Result<PoseSnapshot, GatewayError> {
        let link = self.active_link().await;
        let response = match link.send_stop().await {
            Ok(response) => response,
            Err(err) => {
                self.event_bus
                    .publish(PlatformEvent::error(format!("Failed to stop: {err}")));
                return Err(err.into());
            }
        };
        if !response.is_ok() {
            let message = response.error_message();
            self.event_bus
                .publish(PlatformEvent::error(format!("ESP32 error: {message}")));
            return Err(GatewayError::DeviceError(message));
        }

        let pose = self.motion.lock().await.odometry.snapshot();
        self.event_bus.publish(PlatformEvent::stop_update(
            pose.position,
            pose.angle_deg,
            pose.total_distance,
        ));

        tracing::info!("platform stopped");
        Ok(pose)
    }

    /// Queries the rover's runtime status and broadcasts it as a
    /// status report.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on transport failure.
    pub async fn device_status(&self) -> Result<DeviceStatus, GatewayError> {
        let link = self.active_link().await;
        let status = match link.status().await {
            Ok(status) => status,
            Err(err) => {
                self.event_bus
                    .publish(PlatformEvent::error(format!("Status check failed: {err}")));
                return Err(err.into());
            }
        };

        let pose = self.motion.lock().await.odometry.snapshot();
        self.event_bus.publish(PlatformEvent::status_report(
            pose.position,
            status.current_angle.unwrap_or(pose.angle_deg),
            status.current_speed,
            status.current_direction.clone(),
            status.is_moving,
        ));

        Ok(status)
    }

    /// Queries the rover's static information.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on transport failure or when the
    /// rover reports an error status.
    pub async fn device_info(&self) -> Result<DeviceInfo, GatewayError> {
        let link = self.active_link().await;
        let info = link.info().await?;
        if info.status.as_deref() == Some("error") {
            return Err(GatewayError::DeviceError(
                "device reported an info error".to_string(),
            ));
        }
        Ok(info)
    }

    /// Returns the current estimated pose.
    pub async fn current_position(&self) -> PoseSnapshot {
        self.motion.lock().await.odometry.snapshot()
    }

    /// Returns a copy of the movement log.
    pub async fn movement_history(&self) -> Vec<MovementRecord> {
        self.history.snapshot().await
    }

    /// Returns the pose to the origin. The movement log is kept.
    pub async fn reset_position(&self) -> PoseSnapshot {
        let mut motion = self.motion.lock().await;
        motion.odometry.reset();
        motion.last_movement = Instant::now();
        let pose = motion.odometry.snapshot();
        drop(motion);

        tracing::info!("position reset to origin");
        pose
    }

    /// Updates the wheel radius used for dead reckoning and broadcasts
    /// a configuration notice.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] when the radius is out
    /// of range.
    pub async fn set_wheel_radius(&self, radius_m: f64) -> Result<(), GatewayError> {
        {
            let mut motion = self.motion.lock().await;
            let old = motion.odometry.wheel_radius_m();
            motion.odometry.set_wheel_radius(radius_m)?;
            tracing::info!(old_m = old, new_m = radius_m, "wheel radius updated");
        }

        let circumference = 2.0 * PI * radius_m;
        self.event_bus.publish(PlatformEvent::config_update(format!(
            "Wheel radius updated to {radius_m:.3}m (circumference: {circumference:.4}m)"
        )));
        Ok(())
    }

    async fn active_link(&self) -> Arc<dyn DeviceLink> {
        self.links.get(*self.active.read().await)
    }

    /// Makes `requested` the active protocol, connecting its link and
    /// disconnecting the old one. On connect failure the gateway falls
    /// back to HTTP and the request fails.
    async fn switch_protocol_if_needed(&self, requested: Protocol) -> Result<(), GatewayError> {
        let current = *self.active.read().await;
        if requested == current {
            return Ok(());
        }

        tracing::info!(from = %current, to = %requested, "switching device protocol");
        self.event_bus.publish(PlatformEvent::status_message(format!(
            "Switching to {requested} protocol"
        )));

        let old = self.links.get(current);
        if old.is_connected().await
            && let Err(err) = old.disconnect().await
        {
            tracing::warn!(protocol = %current, error = %err, "error disconnecting old link");
        }

        let new = self.links.get(requested);
        if !new.is_connected().await
            && let Err(err) = new.connect().await
        {
            tracing::error!(protocol = %requested, error = %err, "failed to connect");
            self.event_bus.publish(PlatformEvent::error(format!(
                "Failed to connect via {requested}, falling back to HTTP"
            )));
            *self.active.write().await = Protocol::Http;
            return Err(GatewayError::ProtocolSwitchFailed(requested));
        }

        self.event_bus
            .publish(PlatformEvent::status_message(format!("Connected via {requested}")));
        *self.active.write().await = requested;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::Position;
    use crate::domain::platform_event::UpdateKind;
    use crate::link::{DeviceResponse, LinkError};

    /// Scriptable in-memory device link.
    #[derive(Debug)]
    struct MockLink {
        protocol: Protocol,
        response_status: &'static str,
        response_message: Option<&'static str>,
        device_angle: Option<f64>,
        fail_connect: bool,
        transport_error: bool,
        connected: AtomicBool,
        moves: AtomicUsize,
    }

    impl MockLink {
        fn ok(protocol: Protocol) -> Self {
            Self {
                protocol,
                response_status: "ok",
                response_message: None,
                device_angle: None,
                fail_connect: false,
                transport_error: false,
                connected: AtomicBool::new(protocol == Protocol::Http),
                moves: AtomicUsize::new(0),
            }
        }

        fn device_error(protocol: Protocol, message: &'static str) -> Self {
            Self {
                response_status: "error",
                response_message: Some(message),
                ..Self::ok(protocol)
            }
        }

        fn unreachable(protocol: Protocol) -> Self {
            Self {
                fail_connect: true,
                connected: AtomicBool::new(false),
                ..Self::ok(protocol)
            }
        }

        fn response(&self) -> DeviceResponse {
            DeviceResponse {
                status: Some(self.response_status.to_string()),
                message: self.response_message.map(str::to_string),
                angle: self.device_angle,
                ..DeviceResponse::default()
            }
        }
    }

    #[async_trait]
    impl DeviceLink for MockLink {
        fn protocol(&self) -> Protocol {
            self.protocol
        }

        async fn connect(&self) -> Result<(), LinkError> {
            if self.fail_connect {
                return Err(LinkError::ConnectionFailed("refused".to_string()));
            }
            self.connected.store(true, Ordering::Relaxed);
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), LinkError> {
            self.connected.store(false, Ordering::Relaxed);
            Ok(())
        }

        async fn is_connected(&self) -> bool {
            self.connected.load(Ordering::Relaxed)
        }

        async fn send_move(
            &self,
            _direction: Direction,
            _speed: u8,
            _angle: Option<f64>,
        ) -> Result<DeviceResponse, LinkError> {
            self.moves.fetch_add(1, Ordering::Relaxed);
            if self.transport_error {
                return Err(LinkError::NotConnected);
            }
            Ok(self.response())
        }

        async fn send_stop(&self) -> Result<DeviceResponse, LinkError> {
            if self.transport_error {
                return Err(LinkError::NotConnected);
            }
            Ok(self.response())
        }

        async fn status(&self) -> Result<DeviceStatus, LinkError> {
            Ok(DeviceStatus {
                status: Some("ok".to_string()),
                current_direction: Some("forward".to_string()),
                current_speed: Some(80),
                current_angle: Some(90.0),
                is_moving: Some(true),
                ..DeviceStatus::default()
            })
        }

        async fn info(&self) -> Result<DeviceInfo, LinkError> {
            Ok(DeviceInfo {
                status: Some(self.response_status.to_string()),
                platform_name: Some("esp32-rover".to_string()),
                ..DeviceInfo::default()
            })
        }
    }

    fn make_service(http: MockLink, ws: MockLink, mqtt: MockLink) -> PlatformService {
        let links = LinkSet {
            http: Arc::new(http),
            ws: Arc::new(ws),
            mqtt: Arc::new(mqtt),
        };
        PlatformService::new(links, EventBus::new(100))
    }

    fn all_ok_service() -> PlatformService {
        make_service(
            MockLink::ok(Protocol::Http),
            MockLink::ok(Protocol::WebSocket),
            MockLink::ok(Protocol::Mqtt),
        )
    }

    #[tokio::test]
    async fn move_broadcasts_pose_and_logs_history() {
        let service = all_ok_service();
        let mut rx = service.event_bus().subscribe();

        let pose = service
            .move_platform(Protocol::Http, Direction::Forward, 100, None)
            .await;
        let Ok(pose) = pose else {
            panic!("expected move to succeed");
        };
        assert!(pose.total_distance > 0.0);

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected broadcast");
        };
        assert_eq!(event.kind, UpdateKind::PositionUpdate);
        assert_eq!(event.direction.as_deref(), Some("forward"));
        assert_eq!(event.is_moving, Some(true));

        let history = service.movement_history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history.first().map(|r| r.speed), Some(100));
    }

    #[tokio::test]
    async fn device_error_is_broadcast_and_returned() {
        let service = make_service(
            MockLink::device_error(Protocol::Http, "stalled"),
            MockLink::ok(Protocol::WebSocket),
            MockLink::ok(Protocol::Mqtt),
        );
        let mut rx = service.event_bus().subscribe();

        let result = service
            .move_platform(Protocol::Http, Direction::Forward, 100, None)
            .await;
        assert!(matches!(result, Err(GatewayError::DeviceError(_))));

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected error broadcast");
        };
        assert_eq!(event.kind, UpdateKind::Error);
        assert_eq!(event.message.as_deref(), Some("ESP32 error: stalled"));

        // Failed moves are not logged.
        assert!(service.movement_history().await.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_broadcast() {
        let mut link = MockLink::ok(Protocol::Http);
        link.transport_error = true;
        let service = make_service(
            link,
            MockLink::ok(Protocol::WebSocket),
            MockLink::ok(Protocol::Mqtt),
        );
        let mut rx = service.event_bus().subscribe();

        let result = service
            .move_platform(Protocol::Http, Direction::Forward, 100, None)
            .await;
        assert!(result.is_err());

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected error broadcast");
        };
        let message = event.message.unwrap_or_default();
        assert!(message.starts_with("Failed to communicate"));
    }

    #[tokio::test]
    async fn switching_protocol_connects_the_new_link() {
        let service = all_ok_service();
        let mut rx = service.event_bus().subscribe();

        let result = service
            .move_platform(Protocol::WebSocket, Direction::Forward, 50, None)
            .await;
        assert!(result.is_ok());
        assert_eq!(service.active_protocol().await, Protocol::WebSocket);

        let switching = rx.recv().await.ok().and_then(|e| e.message);
        assert_eq!(switching.as_deref(), Some("Switching to WEBSOCKET protocol"));
        let connected = rx.recv().await.ok().and_then(|e| e.message);
        assert_eq!(connected.as_deref(), Some("Connected via WEBSOCKET"));
    }

    #[tokio::test]
    async fn failed_switch_falls_back_to_http() {
        let service = make_service(
            MockLink::ok(Protocol::Http),
            MockLink::ok(Protocol::WebSocket),
            MockLink::unreachable(Protocol::Mqtt),
        );

        let result = service
            .move_platform(Protocol::Mqtt, Direction::Forward, 50, None)
            .await;
        assert!(matches!(result, Err(GatewayError::ProtocolSwitchFailed(Protocol::Mqtt))));
        assert_eq!(service.active_protocol().await, Protocol::Http);
    }

    #[tokio::test]
    async fn device_reported_angle_overrides_request() {
        let mut http = MockLink::ok(Protocol::Http);
        http.device_angle = Some(90.0);
        let service = make_service(
            http,
            MockLink::ok(Protocol::WebSocket),
            MockLink::ok(Protocol::Mqtt),
        );

        let pose = service
            .move_platform(Protocol::Http, Direction::Forward, 255, Some(45.0))
            .await;
        let Ok(pose) = pose else {
            panic!("expected move to succeed");
        };
        // 90° heading: movement is along Y, not X.
        assert!((pose.angle_deg - 90.0).abs() < 1e-9);
        assert!(pose.position.x.abs() < 1e-9);
        assert!(pose.position.y > 0.0);
    }

    #[tokio::test]
    async fn stop_broadcasts_stationary_update() {
        let service = all_ok_service();
        let mut rx = service.event_bus().subscribe();

        let result = service.stop_platform().await;
        assert!(result.is_ok());

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected broadcast");
        };
        assert_eq!(event.kind, UpdateKind::PositionUpdate);
        assert_eq!(event.direction.as_deref(), Some("stop"));
        assert_eq!(event.is_moving, Some(false));
        assert_eq!(event.speed, Some(0));
    }

    #[tokio::test]
    async fn reset_zeroes_pose_and_keeps_history() {
        let service = all_ok_service();
        let moved = service
            .move_platform(Protocol::Http, Direction::Forward, 200, None)
            .await;
        assert!(moved.is_ok());

        let pose = service.reset_position().await;
        assert_eq!(pose.position, Position::ORIGIN);
        assert!(pose.total_distance.abs() < 1e-9);
        assert_eq!(service.movement_history().await.len(), 1);
    }

    #[tokio::test]
    async fn wheel_radius_update_broadcasts_config_notice() {
        let service = all_ok_service();
        let mut rx = service.event_bus().subscribe();

        assert!(service.set_wheel_radius(0.05).await.is_ok());

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected broadcast");
        };
        assert_eq!(event.kind, UpdateKind::ConfigUpdate);
        let message = event.message.unwrap_or_default();
        assert!(message.contains("0.050m"));
    }

    #[tokio::test]
    async fn wheel_radius_out_of_range_is_rejected() {
        let service = all_ok_service();
        let result = service.set_wheel_radius(0.5).await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn device_status_broadcasts_status_report() {
        let service = all_ok_service();
        let mut rx = service.event_bus().subscribe();

        let status = service.device_status().await;
        let Ok(status) = status else {
            panic!("expected status");
        };
        assert_eq!(status.current_speed, Some(80));

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected broadcast");
        };
        assert_eq!(event.kind, UpdateKind::StatusUpdate);
        assert_eq!(event.angle, Some(90.0));
        assert_eq!(event.is_moving, Some(true));
    }

    #[tokio::test]
    async fn device_info_error_status_fails() {
        let service = make_service(
            MockLink::device_error(Protocol::Http, "flash corrupt"),
            MockLink::ok(Protocol::WebSocket),
            MockLink::ok(Protocol::Mqtt),
        );
        let result = service.device_info().await;
        assert!(matches!(result, Err(GatewayError::DeviceError(_))));
    }
}
