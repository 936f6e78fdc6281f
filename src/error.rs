//! Error types for the bulk sender.

use std::path::PathBuf;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Remote control error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading recipients from a spreadsheet.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Failed to open spreadsheet {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("Spreadsheet {path} has no worksheets")]
    NoWorksheet { path: PathBuf },

    #[error("Spreadsheet is missing the required '{column}' column")]
    MissingColumn { column: String },
}

/// Errors from the admin service. Callers log these and carry on.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// Errors that make the messaging session unusable as a whole.
///
/// Per-recipient delivery problems are not errors; they come back as
/// `AttemptOutcome::Failure` from the driver.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to open messaging client: {0}")]
    Open(String),

    #[error("Session backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors that stop a dispatch run before or during execution.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("This device has been disabled by the administrator")]
    DeviceDisabled,

    #[error("Invalid pacing interval {value}: must be a finite number of seconds >= 0")]
    InvalidPacing { value: f64 },

    #[error("Uniform message is empty")]
    EmptyUniformMessage,

    #[error("Session failed: {0}")]
    Session(#[from] SessionError),

    #[error("Dispatch task was cancelled")]
    Cancelled,

    #[error("Dispatch task panicked: {0}")]
    Panicked(String),
}

/// Errors from reporting sinks.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to write failure log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
