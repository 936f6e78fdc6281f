//! Dry-run driver. Logs what would be sent and reports success.

use async_trait::async_trait;

use super::{AttemptOutcome, SessionDriver};

/// Driver that never touches a messaging client.
#[derive(Debug, Default)]
pub struct DryRunDriver {
    sent: usize,
}

impl DryRunDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages "sent" so far.
    pub fn sent(&self) -> usize {
        self.sent
    }
}

#[async_trait]
impl SessionDriver for DryRunDriver {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn send(&mut self, identifier: &str, text: &str) -> AttemptOutcome {
        self.sent += 1;
        tracing::info!(
            identifier = %identifier,
            preview = %text.chars().take(60).collect::<String>(),
            "Dry run: message not sent"
        );
        AttemptOutcome::Success
    }
}
