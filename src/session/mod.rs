//! Session drivers — the capability that actually submits a message.
//!
//! The dispatch engine only sees the `SessionDriver` trait. The browser
//! implementation is gated behind the `browser` feature; `DryRunDriver`
//! and `ScriptedDriver` need nothing external.

#[cfg(feature = "browser")]
pub mod browser;
pub mod dry_run;
pub mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

#[cfg(feature = "browser")]
pub use browser::WebClientDriver;
pub use dry_run::DryRunDriver;
pub use scripted::ScriptedDriver;

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failure(String),
}

impl AttemptOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Failure reason, if this attempt failed.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failure(reason) => Some(reason),
        }
    }
}

/// One exclusive messaging session.
///
/// Every method takes `&mut self`: a session serves one run at a time and is
/// never driven concurrently. Anything that goes wrong while delivering to
/// one recipient is reported as `AttemptOutcome::Failure`, never as an error;
/// only `open` and `close` can fail the session as a whole.
#[async_trait]
pub trait SessionDriver: Send {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Bring the session up (launch, log in). Called once per run, after the
    /// kill-switch check and before the first `send`.
    async fn open(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    /// Open (or find) the conversation for `identifier` and submit `text`.
    async fn send(&mut self, identifier: &str, text: &str) -> AttemptOutcome;

    /// Tear the session down after the run.
    async fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_accessors() {
        assert!(AttemptOutcome::Success.is_success());
        assert_eq!(AttemptOutcome::Success.reason(), None);

        let failed = AttemptOutcome::failure("no chat");
        assert!(!failed.is_success());
        assert_eq!(failed.reason(), Some("no chat"));
    }

    #[test]
    fn outcome_serializes_tagged() {
        let json = serde_json::to_value(AttemptOutcome::failure("timeout")).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["reason"], "timeout");

        let json = serde_json::to_value(AttemptOutcome::Success).unwrap();
        assert_eq!(json["status"], "success");
    }
}
