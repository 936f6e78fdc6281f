//! Dispatch engine — walks the recipient list against one session.
//!
//! A run:
//! 1. asks the admin service whether this device may run (once, up front)
//! 2. opens the session
//! 3. for each recipient in input order: fail rows with no phone number,
//!    resolve the message, try up to `MAX_ATTEMPTS` times, record the
//!    outcome, emit a progress event, then sleep for the pacing interval
//! 4. closes the session, reports totals and hands the result to the sinks
//!
//! The kill switch is not re-checked mid-run, and no attempt has its own
//! timeout: a driver that never returns stalls the run.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dispatch::model::{DispatchJob, MISSING_IDENTIFIER_REASON, ProgressEvent, RunResult};
use crate::error::DispatchError;
use crate::remote::RemoteControl;
use crate::report::ReportingSink;
use crate::session::{AttemptOutcome, SessionDriver};

/// Attempts per recipient (the first try plus one retry).
pub const MAX_ATTEMPTS: usize = 2;

/// Runs dispatch jobs. Holds only shared, read-only collaborators, so one
/// engine can serve any number of sequential runs.
pub struct DispatchEngine {
    remote: Arc<dyn RemoteControl>,
    sinks: Vec<Arc<dyn ReportingSink>>,
}

impl DispatchEngine {
    pub fn new(remote: Arc<dyn RemoteControl>) -> Self {
        Self {
            remote,
            sinks: Vec::new(),
        }
    }

    /// Add a sink that receives every completed run's result.
    pub fn with_sink(mut self, sink: Arc<dyn ReportingSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Execute `job` on `session`, streaming one progress event per recipient.
    ///
    /// Returns `DeviceDisabled` without touching the session when the admin
    /// service has switched this device off, and a `Session` error when the
    /// session cannot be opened. Per-recipient failures never end the run.
    /// Progress events are dropped silently if nobody is listening.
    pub async fn run(
        &self,
        job: &DispatchJob,
        session: &mut dyn SessionDriver,
        progress: &mpsc::UnboundedSender<ProgressEvent>,
    ) -> Result<RunResult, DispatchError> {
        if !self.remote.check_enabled().await {
            warn!("Dispatch refused: device disabled by administrator");
            return Err(DispatchError::DeviceDisabled);
        }

        info!(
            recipients = job.len(),
            pacing_ms = job.pacing().as_millis() as u64,
            session = session.name(),
            "Starting dispatch run"
        );

        session.open().await?;

        let mut result = RunResult::started();
        let total = job.len();

        for (i, record) in job.recipients().iter().enumerate() {
            let index = i + 1;

            let outcome = if !record.has_identifier() {
                AttemptOutcome::failure(MISSING_IDENTIFIER_REASON)
            } else {
                match job.resolve_message(record) {
                    Ok(text) => deliver(session, &record.identifier, text).await,
                    Err(reason) => {
                        debug!(identifier = %record.identifier, "No message to send");
                        AttemptOutcome::Failure(reason)
                    }
                }
            };

            match outcome {
                AttemptOutcome::Success => {
                    info!(index, total, identifier = %record.identifier, "Message sent")
                }
                AttemptOutcome::Failure(ref reason) => {
                    warn!(index, total, identifier = %record.identifier, reason = %reason, "Message failed")
                }
            }

            result.record(&record.identifier, &outcome);

            let _ = progress.send(ProgressEvent {
                index,
                total,
                identifier: record.identifier.clone(),
                outcome,
            });

            tokio::time::sleep(job.pacing()).await;
        }

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close session cleanly");
        }

        result.finished_at = chrono::Utc::now();
        info!(
            sent = result.sent_count,
            failed = result.failed_count(),
            "Dispatch run complete"
        );

        self.finish(&result).await;
        Ok(result)
    }

    /// Report totals and fan the result out to every sink. Nothing here can
    /// change the result.
    async fn finish(&self, result: &RunResult) {
        self.remote
            .report_stats(result.sent_count as u64, result.failed_count() as u64)
            .await;

        for sink in &self.sinks {
            if let Err(e) = sink.deliver(result).await {
                warn!(sink = sink.name(), error = %e, "Reporting sink failed");
            }
        }
    }
}

/// Try one recipient up to `MAX_ATTEMPTS` times with no pause between tries.
/// A double failure keeps the last attempt's reason.
async fn deliver(session: &mut dyn SessionDriver, identifier: &str, text: &str) -> AttemptOutcome {
    let mut last = AttemptOutcome::failure("no attempt made");
    for attempt in 1..=MAX_ATTEMPTS {
        let outcome = session.send(identifier, text).await;
        if outcome.is_success() {
            return outcome;
        }
        debug!(
            identifier = %identifier,
            attempt,
            reason = outcome.reason().unwrap_or_default(),
            "Attempt failed"
        );
        last = outcome;
    }
    last
}
