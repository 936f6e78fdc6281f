//! Dispatch data model: recipients, jobs, progress events and run results.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::session::AttemptOutcome;

/// Failure reason recorded when a recipient has no message to send.
pub const MISSING_MESSAGE_REASON: &str = "missing message";

/// Failure reason recorded for a row that has no phone number.
pub const MISSING_IDENTIFIER_REASON: &str = "missing phone number";

/// One input row: who to message and, optionally, what to say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientRecord {
    pub identifier: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl RecipientRecord {
    pub fn new(identifier: impl Into<String>, message: Option<String>) -> Self {
        Self {
            identifier: identifier.into(),
            message,
        }
    }

    pub fn with_message(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(identifier, Some(message.into()))
    }

    /// Rows with a blank phone cell are kept so they show up as failures.
    pub fn has_identifier(&self) -> bool {
        !self.identifier.trim().is_empty()
    }
}

/// Where each recipient's message body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageStrategy {
    /// Same text for everyone.
    Uniform(String),
    /// Each record's own `message` field.
    PerRecipient,
}

/// A validated, immutable dispatch run description.
#[derive(Debug, Clone)]
pub struct DispatchJob {
    recipients: Vec<RecipientRecord>,
    strategy: MessageStrategy,
    pacing: Duration,
}

impl DispatchJob {
    /// Build a job, rejecting an unusable pacing value or an empty uniform
    /// message before anything is sent.
    pub fn new(
        recipients: Vec<RecipientRecord>,
        strategy: MessageStrategy,
        pacing_secs: f64,
    ) -> Result<Self, DispatchError> {
        // try_from rejects NaN, negative and out-of-range values alike.
        let pacing = Duration::try_from_secs_f64(pacing_secs)
            .map_err(|_| DispatchError::InvalidPacing { value: pacing_secs })?;

        let strategy = match strategy {
            MessageStrategy::Uniform(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    return Err(DispatchError::EmptyUniformMessage);
                }
                MessageStrategy::Uniform(text)
            }
            MessageStrategy::PerRecipient => MessageStrategy::PerRecipient,
        };

        Ok(Self {
            recipients,
            strategy,
            pacing,
        })
    }

    pub fn recipients(&self) -> &[RecipientRecord] {
        &self.recipients
    }

    pub fn strategy(&self) -> &MessageStrategy {
        &self.strategy
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Message body for `record`, or the failure reason when there is none.
    pub fn resolve_message<'a>(&'a self, record: &'a RecipientRecord) -> Result<&'a str, String> {
        match self.strategy {
            MessageStrategy::Uniform(ref text) => Ok(text.as_str()),
            MessageStrategy::PerRecipient => record
                .message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .ok_or_else(|| MISSING_MESSAGE_REASON.to_string()),
        }
    }
}

/// Emitted once per recipient, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// 1-based position in the recipient list.
    pub index: usize,
    pub total: usize,
    pub identifier: String,
    pub outcome: AttemptOutcome,
}

impl ProgressEvent {
    /// Share of the run completed, 0–100.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.index as f64 / self.total as f64 * 100.0
    }
}

/// A recipient that could not be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub identifier: String,
    pub reason: String,
}

/// Final tally of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub sent_count: usize,
    pub failures: Vec<FailureRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    pub(crate) fn started() -> Self {
        let now = Utc::now();
        Self {
            sent_count: 0,
            failures: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub(crate) fn record(&mut self, identifier: &str, outcome: &AttemptOutcome) {
        match outcome {
            AttemptOutcome::Success => self.sent_count += 1,
            AttemptOutcome::Failure(reason) => self.failures.push(FailureRecord {
                identifier: identifier.to_string(),
                reason: reason.clone(),
            }),
        }
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Recipients processed.
    pub fn total(&self) -> usize {
        self.sent_count + self.failures.len()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
