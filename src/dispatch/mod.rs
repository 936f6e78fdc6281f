//! Message dispatch: the job model, the engine and its background runner.

pub mod engine;
pub mod model;
pub mod task;

pub use engine::{DispatchEngine, MAX_ATTEMPTS};
pub use model::{
    DispatchJob, FailureRecord, MessageStrategy, ProgressEvent, RecipientRecord, RunResult,
};
pub use task::{DispatchHandle, join_task, spawn_dispatch};
