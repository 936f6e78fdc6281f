//! Wire types for the admin service JSON API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Control status value that disables a device.
pub const STATUS_INACTIVE: &str = "inactive";

/// `POST /api/devices/register` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub device_id: Uuid,
    pub device_name: String,
    pub version: String,
}

/// `GET /api/devices/get-control` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlResponse {
    #[serde(default)]
    pub control: Option<DeviceControl>,
}

/// Admin-set control record for one device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceControl {
    #[serde(default)]
    pub status: Option<String>,
}

impl ControlResponse {
    /// A device is enabled unless its control status is explicitly `inactive`.
    pub fn is_enabled(&self) -> bool {
        !matches!(
            self.control.as_ref().and_then(|c| c.status.as_deref()),
            Some(STATUS_INACTIVE)
        )
    }
}

/// `POST /api/devices/update-stats` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRequest {
    pub device_id: Uuid,
    pub messages_sent: u64,
    pub messages_failed: u64,
}

/// `POST /api/devices/heartbeat` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub device_id: Uuid,
}

/// `GET /api/devices/get-update` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateResponse {
    #[serde(default)]
    pub update: Option<UpdateInfo>,
}

/// Latest published release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub version: String,
    #[serde(default)]
    pub changelog: Option<String>,
    pub download_url: String,
}
