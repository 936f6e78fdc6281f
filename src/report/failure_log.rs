//! Failure log: a CSV of every recipient that could not be reached.
//!
//! Written once at run end, and only when something failed. Columns are
//! `Phone,Error`, matching the input spreadsheet's identifier column name.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::ReportingSink;
use crate::dispatch::{FailureRecord, RunResult};
use crate::error::ReportError;

const HEADER: &str = "Phone,Error";

/// Writes failed recipients to a CSV file.
#[derive(Debug, Clone)]
pub struct FailureLogSink {
    path: PathBuf,
}

impl FailureLogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Render failures as CSV, header first, one row per failure.
pub fn render_csv(failures: &[FailureRecord]) -> String {
    let mut out = String::with_capacity(HEADER.len() + failures.len() * 48);
    out.push_str(HEADER);
    out.push('\n');
    for failure in failures {
        out.push_str(&escape_field(&failure.identifier));
        out.push(',');
        out.push_str(&escape_field(&failure.reason));
        out.push('\n');
    }
    out
}

/// Quote a field when it contains a delimiter, quote, or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[async_trait]
impl ReportingSink for FailureLogSink {
    fn name(&self) -> &str {
        "failure-log"
    }

    async fn deliver(&self, result: &RunResult) -> Result<(), ReportError> {
        if result.failures.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ReportError::Write {
                    path: self.path.clone(),
                    source,
                })?;
        }

        tokio::fs::write(&self.path, render_csv(&result.failures))
            .await
            .map_err(|source| ReportError::Write {
                path: self.path.clone(),
                source,
            })?;

        tracing::info!(
            path = %self.path.display(),
            count = result.failures.len(),
            "Wrote failure log"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::RunResult;
    use crate::session::AttemptOutcome;

    fn result_with(outcomes: &[(&str, AttemptOutcome)]) -> RunResult {
        let mut result = RunResult::started();
        for (id, outcome) in outcomes {
            result.record(id, outcome);
        }
        result
    }

    #[test]
    fn csv_escapes_commas_quotes_and_newlines() {
        let rows = vec![
            FailureRecord {
                identifier: "201111111111".into(),
                reason: "plain".into(),
            },
            FailureRecord {
                identifier: "201222222222".into(),
                reason: "element \"x\" missing, retry\nlater".into(),
            },
        ];
        let csv = render_csv(&rows);
        assert_eq!(
            csv,
            "Phone,Error\n201111111111,plain\n201222222222,\"element \"\"x\"\" missing, retry\nlater\"\n"
        );
    }

    #[tokio::test]
    async fn no_file_when_nothing_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed_log.csv");
        let sink = FailureLogSink::new(&path);

        sink.deliver(&result_with(&[("a", AttemptOutcome::Success)]))
            .await
            .unwrap();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn writes_failures_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("failed_log.csv");
        let sink = FailureLogSink::new(&path);

        sink.deliver(&result_with(&[
            ("a", AttemptOutcome::failure("first")),
            ("b", AttemptOutcome::Success),
            ("c", AttemptOutcome::failure("third")),
        ]))
        .await
        .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Phone,Error\na,first\nc,third\n");
    }
}
