//! Background dispatch: runs the engine on its own task and streams
//! progress back to whoever renders it.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::warn;

use crate::dispatch::engine::DispatchEngine;
use crate::dispatch::model::{DispatchJob, ProgressEvent, RunResult};
use crate::error::DispatchError;
use crate::session::SessionDriver;

/// Handle to a dispatch run in progress.
///
/// The run owns its session until it finishes. `abort` is the quit signal:
/// the task is torn down where it stands and no result is produced.
pub struct DispatchHandle {
    progress: mpsc::UnboundedReceiver<ProgressEvent>,
    task: JoinHandle<Result<RunResult, DispatchError>>,
}

/// Start `job` on a background task.
pub fn spawn_dispatch(
    engine: Arc<DispatchEngine>,
    job: DispatchJob,
    mut session: Box<dyn SessionDriver>,
) -> DispatchHandle {
    let (tx, rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(async move {
        let result = engine.run(&job, session.as_mut(), &tx).await;
        if result.is_err() {
            // Runs that bail before the loop may leave the session half open.
            if let Err(e) = session.close().await {
                warn!(error = %e, "Failed to close session after aborted run");
            }
        }
        result
    });

    DispatchHandle { progress: rx, task }
}

impl DispatchHandle {
    /// Next progress event, or `None` once the run has ended.
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        self.progress.recv().await
    }

    /// Stop the run immediately.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Split into a progress stream and the task's join handle.
    pub fn into_parts(
        self,
    ) -> (
        UnboundedReceiverStream<ProgressEvent>,
        JoinHandle<Result<RunResult, DispatchError>>,
    ) {
        (UnboundedReceiverStream::new(self.progress), self.task)
    }

    /// Wait for the run to end. Events not yet read are discarded.
    pub async fn join(self) -> Result<RunResult, DispatchError> {
        join_task(self.task).await
    }
}

/// Await a dispatch task, folding join failures into `DispatchError`.
pub async fn join_task(
    task: JoinHandle<Result<RunResult, DispatchError>>,
) -> Result<RunResult, DispatchError> {
    match task.await {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Err(DispatchError::Cancelled),
        Err(e) => Err(DispatchError::Panicked(e.to_string())),
    }
}
