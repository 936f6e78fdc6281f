//! HTTP client for the admin service.
//!
//! Every call is a single request with a short timeout and no retries.
//! Failures are logged and degraded to the "service unreachable" answer;
//! nothing here can abort a dispatch run except an explicit `inactive`
//! control status.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::identity::DeviceIdentity;
use crate::remote::types::{
    ControlResponse, HeartbeatRequest, RegisterRequest, StatsRequest, UpdateInfo, UpdateResponse,
};

const REGISTER_PATH: &str = "/api/devices/register";
const CONTROL_PATH: &str = "/api/devices/get-control";
const STATS_PATH: &str = "/api/devices/update-stats";
const UPDATE_PATH: &str = "/api/devices/get-update";
const HEARTBEAT_PATH: &str = "/api/devices/heartbeat";

/// Best-effort operations against the admin service.
///
/// Implementations never return errors: each method already applies its
/// degradation policy.
#[async_trait]
pub trait RemoteControl: Send + Sync {
    /// Announce this device. Returns whether the service accepted it.
    async fn register(&self) -> bool;

    /// Kill-switch check. `false` only when the service explicitly marks the
    /// device inactive; any error counts as enabled.
    async fn check_enabled(&self) -> bool;

    /// Report run totals. Fire-and-forget.
    async fn report_stats(&self, sent: u64, failed: u64);

    /// Latest published release, if any.
    async fn check_update(&self) -> Option<UpdateInfo>;

    /// Refresh this device's last-seen time. Returns whether it was accepted.
    async fn heartbeat(&self) -> bool;
}

/// `RemoteControl` over HTTPS + JSON.
pub struct HttpRemoteControl {
    identity: DeviceIdentity,
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemoteControl {
    pub fn new(config: &RemoteConfig, identity: DeviceIdentity) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::RequestFailed {
                endpoint: config.base_url.clone(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            identity,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Identity sent with every call.
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), RemoteError> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| RemoteError::RequestFailed {
                endpoint: path.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(RemoteError::Status {
                endpoint: path.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, RemoteError> {
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| RemoteError::RequestFailed {
                endpoint: path.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(RemoteError::Status {
                endpoint: path.to_string(),
                status: resp.status().as_u16(),
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| RemoteError::InvalidResponse {
                endpoint: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Register, surfacing the error instead of swallowing it.
    pub async fn try_register(&self) -> Result<(), RemoteError> {
        let body = RegisterRequest {
            device_id: self.identity.device_id,
            device_name: self.identity.device_name.clone(),
            version: self.identity.version.clone(),
        };
        self.post_json(REGISTER_PATH, &body).await
    }

    /// Fetch the raw control record for this device.
    pub async fn fetch_control(&self) -> Result<ControlResponse, RemoteError> {
        self.get_json(
            CONTROL_PATH,
            &[("deviceId", self.identity.device_id.to_string())],
        )
        .await
    }

    pub async fn try_report_stats(&self, sent: u64, failed: u64) -> Result<(), RemoteError> {
        let body = StatsRequest {
            device_id: self.identity.device_id,
            messages_sent: sent,
            messages_failed: failed,
        };
        self.post_json(STATS_PATH, &body).await
    }

    pub async fn fetch_update(&self) -> Result<Option<UpdateInfo>, RemoteError> {
        let resp: UpdateResponse = self.get_json(UPDATE_PATH, &[]).await?;
        Ok(resp.update)
    }

    pub async fn try_heartbeat(&self) -> Result<(), RemoteError> {
        let body = HeartbeatRequest {
            device_id: self.identity.device_id,
        };
        self.post_json(HEARTBEAT_PATH, &body).await
    }
}

#[async_trait]
impl RemoteControl for HttpRemoteControl {
    async fn register(&self) -> bool {
        match self.try_register().await {
            Ok(()) => {
                tracing::info!(device_id = %self.identity.device_id, "Device registered");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Device registration failed");
                false
            }
        }
    }

    async fn check_enabled(&self) -> bool {
        match self.fetch_control().await {
            Ok(control) => control.is_enabled(),
            Err(e) => {
                tracing::warn!(error = %e, "Control check failed; assuming enabled");
                true
            }
        }
    }

    async fn report_stats(&self, sent: u64, failed: u64) {
        if let Err(e) = self.try_report_stats(sent, failed).await {
            tracing::warn!(error = %e, sent, failed, "Failed to report stats");
        }
    }

    async fn check_update(&self) -> Option<UpdateInfo> {
        match self.fetch_update().await {
            Ok(update) => update,
            Err(e) => {
                tracing::debug!(error = %e, "Update check failed");
                None
            }
        }
    }

    async fn heartbeat(&self) -> bool {
        match self.try_heartbeat().await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Heartbeat failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    /// Client pointed at a port nothing listens on.
    fn unreachable_client() -> HttpRemoteControl {
        let config = RemoteConfig {
            base_url: "http://127.0.0.1:9/".to_string(),
            timeout: Duration::from_millis(500),
            heartbeat_interval: None,
        };
        HttpRemoteControl::new(&config, DeviceIdentity::generate()).unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = unreachable_client();
        assert_eq!(client.url(REGISTER_PATH), "http://127.0.0.1:9/api/devices/register");
    }

    #[tokio::test]
    async fn unreachable_service_fails_open() {
        let client = unreachable_client();
        assert!(client.check_enabled().await);
        assert!(!client.register().await);
        assert!(!client.heartbeat().await);
        assert!(client.check_update().await.is_none());
        client.report_stats(3, 1).await;
    }

    #[tokio::test]
    async fn unreachable_service_surfaces_typed_errors() {
        let client = unreachable_client();
        let err = client.try_register().await.unwrap_err();
        assert!(matches!(err, RemoteError::RequestFailed { .. }));
    }
}
