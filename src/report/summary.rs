//! Console summary printed when a run completes.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::ReportingSink;
use crate::dispatch::RunResult;
use crate::error::ReportError;

const MTIME_SLACK_SECS: i64 = 2;

/// Prints the run totals to stderr.
#[derive(Debug, Clone, Default)]
pub struct SummarySink {
    failure_log: Option<PathBuf>,
}

impl SummarySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mention where failures were written.
    pub fn with_failure_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.failure_log = Some(path.into());
        self
    }

    /// Summary text for `result`. `log_saved` says whether the failure log
    /// is actually on disk.
    pub fn render(&self, result: &RunResult, log_saved: bool) -> String {
        let mut text = format!(
            "Dispatch complete\n\n  Sent:   {}\n  Failed: {}\n  Took:   {}s\n",
            result.sent_count,
            result.failed_count(),
            result.duration().num_seconds()
        );
        if result.failed_count() > 0
            && let Some(ref path) = self.failure_log
        {
            if log_saved {
                text.push_str(&format!("\nFailed recipients saved to {}\n", path.display()));
            } else {
                text.push_str(&format!(
                    "\nFailed recipients could not be saved to {}\n",
                    path.display()
                ));
            }
        }
        text
    }

    /// Whether the failure log was written during this run: a regular file
    /// modified no earlier than `since`. Sinks run in order, so this sees the
    /// failure log sink's outcome when that sink was added first.
    pub async fn log_saved(&self, since: DateTime<Utc>) -> bool {
        let Some(ref path) = self.failure_log else {
            return false;
        };
        let Ok(meta) = tokio::fs::metadata(path).await else {
            return false;
        };
        // Some filesystems keep coarse modification times.
        let since = since - chrono::Duration::seconds(MTIME_SLACK_SECS);
        meta.is_file()
            && meta
                .modified()
                .map(|t| DateTime::<Utc>::from(t) >= since)
                .unwrap_or(true)
    }
}

#[async_trait]
impl ReportingSink for SummarySink {
    fn name(&self) -> &str {
        "summary"
    }

    async fn deliver(&self, result: &RunResult) -> Result<(), ReportError> {
        let log_saved = result.failed_count() > 0 && self.log_saved(result.started_at).await;
        eprintln!("\n{}", self.render(result, log_saved));
        Ok(())
    }
}
