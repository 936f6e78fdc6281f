//! Where a finished run's result goes.

pub mod failure_log;
pub mod summary;

use async_trait::async_trait;

use crate::dispatch::RunResult;
use crate::error::ReportError;

pub use failure_log::FailureLogSink;
pub use summary::SummarySink;

/// Consumer of a completed run's result.
#[async_trait]
pub trait ReportingSink: Send + Sync {
    /// Sink name for logs.
    fn name(&self) -> &str;

    /// Take the final result. Called once per completed run.
    async fn deliver(&self, result: &RunResult) -> Result<(), ReportError>;
}
