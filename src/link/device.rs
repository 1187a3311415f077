//! Responses the rover sends back.
//!
//! The firmware is lax about which fields it populates, so everything
//! except the envelope is optional. Field names are camelCase on the
//! wire; unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Acknowledgement for a move or stop command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    /// `"ok"` on success, `"error"` otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Failure description when `status` is `"error"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Direction the firmware acted on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// Speed the firmware acted on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<i32>,
    /// Measured heading in degrees, when the firmware reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    /// Firmware-side timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Firmware operation counter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<i32>,
    /// Whether the motors are running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_moving: Option<bool>,
}

impl DeviceResponse {
    /// Returns `true` when the rover reported success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }

    /// Failure description, with a fallback for silent firmware.
    #[must_use]
    pub fn error_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// Runtime status report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    /// `"ok"` or `"error"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Direction currently being driven.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_direction: Option<String>,
    /// Speed currently being driven.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_speed: Option<i32>,
    /// Measured heading in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_angle: Option<f64>,
    /// Whether the motors are running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_moving: Option<bool>,
    /// Milliseconds since firmware boot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    /// Milliseconds the current operation has been running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_duration: Option<u64>,
    /// Wi-Fi association state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi_status: Option<String>,
    /// IP address on the local network.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// Static device information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// `"ok"` or `"error"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Firmware-reported platform name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_name: Option<String>,
    /// Firmware version string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// IP address on the local network.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// HTTP endpoints the firmware exposes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<String>>,
    /// Supported command ranges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<DeviceCapabilities>,
}

/// Supported command ranges, as the firmware advertises them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCapabilities {
    /// Comma-separated direction list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directions: Option<String>,
    /// Supported speed range, e.g. `"0-255"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_range: Option<String>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn ok_status_is_ok() {
        let resp: Option<DeviceResponse> =
            serde_json::from_str(r#"{"status":"ok","direction":"forward","speed":100}"#).ok();
        let Some(resp) = resp else {
            panic!("deserialization failed");
        };
        assert!(resp.is_ok());
    }

    #[test]
    fn missing_status_is_not_ok() {
        let resp: Option<DeviceResponse> = serde_json::from_str(r#"{"speed":100}"#).ok();
        let Some(resp) = resp else {
            panic!("deserialization failed");
        };
        assert!(!resp.is_ok());
        assert_eq!(resp.error_message(), "Unknown error");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let resp: Option<DeviceStatus> = serde_json::from_str(
            r#"{"status":"ok","currentSpeed":80,"isMoving":true,"rssi":-60}"#,
        )
        .ok();
        let Some(resp) = resp else {
            panic!("deserialization failed");
        };
        assert_eq!(resp.current_speed, Some(80));
        assert_eq!(resp.is_moving, Some(true));
    }

    #[test]
    fn info_capabilities_round_trip() {
        let json = r#"{
            "status": "ok",
            "platformName": "esp32-rover",
            "version": "1.4.0",
            "endpoints": ["/move", "/stop", "/status"],
            "capabilities": {"directions": "forward,backward,left,right", "speedRange": "0-255"}
        }"#;
        let info: Option<DeviceInfo> = serde_json::from_str(json).ok();
        let Some(info) = info else {
            panic!("deserialization failed");
        };
        assert_eq!(info.platform_name.as_deref(), Some("esp32-rover"));
        let caps = info.capabilities.unwrap_or_default();
        assert_eq!(caps.speed_range.as_deref(), Some("0-255"));
    }
}
