//! Device identity — the id and name this install reports to the admin service.
//!
//! A fresh identity is generated per process unless a device file is
//! configured, in which case the first generated identity is saved and
//! reused on later launches.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ConfigError;

/// Identity shared read-only by every remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub device_id: Uuid,
    pub device_name: String,
    pub version: String,
}

impl DeviceIdentity {
    /// Build an identity from explicit parts (used by tests and persisted state).
    pub fn new(device_id: Uuid, device_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            device_id,
            device_name: device_name.into(),
            version: version.into(),
        }
    }

    /// Generate a random identity named after this host.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4(), host_name(), env!("CARGO_PKG_VERSION"))
    }

    /// Load the identity stored at `path`, or generate and save a new one.
    ///
    /// The stored version is refreshed to the running binary's version.
    pub async fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => {
                let mut identity: Self = serde_json::from_str(&raw)?;
                identity.version = env!("CARGO_PKG_VERSION").to_string();
                info!(device_id = %identity.device_id, path = %path.display(), "Loaded device identity");
                Ok(identity)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let identity = Self::generate();
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(path, serde_json::to_vec_pretty(&identity)?).await?;
                info!(device_id = %identity.device_id, path = %path.display(), "Created device identity");
                Ok(identity)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Host name of this machine, or "Unknown" when it can't be read.
pub fn host_name() -> String {
    match hostname::get() {
        Ok(h) => h.to_string_lossy().to_string(),
        Err(e) => {
            warn!(error = %e, "Could not read host name");
            "Unknown".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_gives_distinct_ids() {
        let a = DeviceIdentity::generate();
        let b = DeviceIdentity::generate();
        assert_ne!(a.device_id, b.device_id);
        assert_eq!(a.version, env!("CARGO_PKG_VERSION"));
        assert!(!a.device_name.is_empty());
    }

    #[tokio::test]
    async fn load_or_create_persists_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("device.json");

        let first = DeviceIdentity::load_or_create(&path).await.unwrap();
        assert!(path.exists());

        let second = DeviceIdentity::load_or_create(&path).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn load_refreshes_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.json");
        let stored = DeviceIdentity::new(Uuid::new_v4(), "old-box", "0.0.1");
        std::fs::write(&path, serde_json::to_string(&stored).unwrap()).unwrap();

        let loaded = DeviceIdentity::load_or_create(&path).await.unwrap();
        assert_eq!(loaded.device_id, stored.device_id);
        assert_eq!(loaded.device_name, "old-box");
        assert_eq!(loaded.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.json");
        std::fs::write(&path, "not json").unwrap();

        let result = DeviceIdentity::load_or_create(&path).await;
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }
}
