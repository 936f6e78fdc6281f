//! Admin service integration: registration, kill switch, stats, updates.

pub mod client;
pub mod heartbeat;
pub mod types;

pub use client::{HttpRemoteControl, RemoteControl};
pub use heartbeat::spawn_heartbeat;
pub use types::UpdateInfo;
