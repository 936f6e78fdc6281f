//! Background heartbeat loop: keeps the device's last-seen time fresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::remote::RemoteControl;

/// Spawn a task that sends a heartbeat every `interval` until aborted.
///
/// The first heartbeat fires immediately.
pub fn spawn_heartbeat(remote: Arc<dyn RemoteControl>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Heartbeat started (interval: {}s)", interval.as_secs());

        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tick.tick().await;
            if !remote.heartbeat().await {
                debug!("Heartbeat not acknowledged");
            }
        }
    })
}
