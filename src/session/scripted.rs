//! Replays queued outcomes per recipient and records every call.
//!
//! Used by tests and rehearsals to exercise the dispatch engine without a
//! browser.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{AttemptOutcome, SessionDriver};
use crate::error::SessionError;

/// One recorded `send` call.
#[derive(Debug, Clone)]
pub struct SentCall {
    pub identifier: String,
    pub text: String,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct LogInner {
    sends: Mutex<Vec<SentCall>>,
    opens: AtomicUsize,
    closes: AtomicUsize,
}

/// Shared view of the calls a `ScriptedDriver` received.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<LogInner>);

impl CallLog {
    /// Every `send` call, in order.
    pub fn calls(&self) -> Vec<SentCall> {
        self.0.sends.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.sends.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Number of times the session was opened.
    pub fn opens(&self) -> usize {
        self.0.opens.load(Ordering::SeqCst)
    }

    /// Number of times the session was closed.
    pub fn closes(&self) -> usize {
        self.0.closes.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls made for one identifier, in order.
    pub fn for_identifier(&self, identifier: &str) -> Vec<SentCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.identifier == identifier)
            .collect()
    }

    fn push(&self, call: SentCall) {
        if let Ok(mut calls) = self.0.sends.lock() {
            calls.push(call);
        }
    }
}

/// Driver whose answers are queued up front.
///
/// Each identifier has its own queue; once a queue is empty (or was never
/// set) the driver answers with the default outcome.
#[derive(Debug)]
pub struct ScriptedDriver {
    scripts: HashMap<String, VecDeque<AttemptOutcome>>,
    default_outcome: AttemptOutcome,
    delay: Option<Duration>,
    open_error: Option<String>,
    close_error: Option<String>,
    log: CallLog,
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDriver {
    /// Driver that succeeds unless told otherwise.
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            default_outcome: AttemptOutcome::Success,
            delay: None,
            open_error: None,
            close_error: None,
            log: CallLog::default(),
        }
    }

    /// Driver that fails every unscripted attempt with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            default_outcome: AttemptOutcome::failure(reason),
            ..Self::new()
        }
    }

    /// Queue outcomes for successive attempts on `identifier`.
    pub fn script<I>(mut self, identifier: &str, outcomes: I) -> Self
    where
        I: IntoIterator<Item = AttemptOutcome>,
    {
        self.scripts
            .entry(identifier.to_string())
            .or_default()
            .extend(outcomes);
        self
    }

    /// Sleep this long inside every `send`, like a real session's settle time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make `open` fail, as when the browser can't be launched.
    pub fn fail_open(mut self, reason: impl Into<String>) -> Self {
        self.open_error = Some(reason.into());
        self
    }

    /// Make `close` fail after counting the call.
    pub fn fail_close(mut self, reason: impl Into<String>) -> Self {
        self.close_error = Some(reason.into());
        self
    }

    /// Handle to the calls this driver receives (stays valid after the
    /// driver is moved into a task).
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

#[async_trait]
impl SessionDriver for ScriptedDriver {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open(&mut self) -> Result<(), SessionError> {
        self.log.0.opens.fetch_add(1, Ordering::SeqCst);
        match self.open_error {
            Some(ref reason) => Err(SessionError::Open(reason.clone())),
            None => Ok(()),
        }
    }

    async fn send(&mut self, identifier: &str, text: &str) -> AttemptOutcome {
        self.log.push(SentCall {
            identifier: identifier.to_string(),
            text: text.to_string(),
            at: Instant::now(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.scripts
            .get_mut(identifier)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| self.default_outcome.clone())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.log.0.closes.fetch_add(1, Ordering::SeqCst);
        match self.close_error {
            Some(ref reason) => Err(SessionError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script_then_falls_back_to_default() {
        let mut driver = ScriptedDriver::new().script(
            "a",
            [AttemptOutcome::failure("first"), AttemptOutcome::failure("second")],
        );
        let log = driver.log();

        assert_eq!(driver.send("a", "x").await, AttemptOutcome::failure("first"));
        assert_eq!(driver.send("a", "x").await, AttemptOutcome::failure("second"));
        assert_eq!(driver.send("a", "x").await, AttemptOutcome::Success);
        assert_eq!(driver.send("b", "y").await, AttemptOutcome::Success);

        assert_eq!(log.len(), 4);
        assert_eq!(log.for_identifier("a").len(), 3);
        assert_eq!(log.for_identifier("b")[0].text, "y");
    }

    #[tokio::test]
    async fn open_and_close_are_counted() {
        let mut driver = ScriptedDriver::new();
        let log = driver.log();
        driver.open().await.unwrap();
        driver.close().await.unwrap();
        assert_eq!(log.opens(), 1);
        assert_eq!(log.closes(), 1);

        let mut broken = ScriptedDriver::new().fail_open("no browser");
        assert!(matches!(broken.open().await, Err(SessionError::Open(_))));
    }

    #[tokio::test]
    async fn failing_driver_uses_reason() {
        let mut driver = ScriptedDriver::failing("offline");
        assert_eq!(driver.send("a", "x").await, AttemptOutcome::failure("offline"));
    }
}
