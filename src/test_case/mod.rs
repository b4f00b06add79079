//! # Test Case
//!
//! A single schedulable unit of work: a bound callable plus the status state
//! machine, elapsed-time tracking and captured failures for its executions.
//!
//! ## Lifecycle
//!
//! ```text
//! new ─▶ setup ─▶ run ─▶ Running ─▶ Complete | Failed | Fatal | Timeout | Canceled
//!                  ▲                                  │
//!                  └──────────── reset ◀──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use testbed::test_case::{Completion, TestCase, TestConfig};
//! use testbed::{Assertions, TestStatus};
//!
//! let mut case = TestCase::new("adds_numbers", TestConfig::default());
//! case.setup_fn(|case| {
//!     case.is_true(1 + 1 == 2);
//!     Ok(Completion::Finished)
//! })
//! .unwrap();
//!
//! case.run().unwrap();
//! assert_eq!(case.status(), TestStatus::Complete);
//! ```

pub mod assertions;
pub mod handle;

pub use assertions::Assertions;
pub use handle::CaseHandle;

use crate::constants;
use crate::error::{Result, TestbedError};
use crate::logging::LogSink;
use crate::state_machine::TestStatus;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// How a test body hands control back to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The body did all its work; settle as `Complete` unless it already settled
    Finished,
    /// Work continues after the call; something will call a finalizer later
    Deferred,
}

/// Return type of every test body
pub type TestResult = anyhow::Result<Completion>;

/// Bound unit of work, receiving the owning case
pub type TestFn = Arc<dyn Fn(&TestCase) -> TestResult + Send + Sync>;

/// Per-test settings, fixed before the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConfig {
    pub channel: i32,
    /// Zero disables the timeout
    pub timeout_ms: u64,
    pub cancel_on_fail: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            channel: constants::DEFAULT_CHANNEL,
            timeout_ms: constants::DEFAULT_TIMEOUT_MS,
            cancel_on_fail: constants::DEFAULT_CANCEL_ON_FAIL,
        }
    }
}

impl TestConfig {
    pub fn with_channel(mut self, channel: i32) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_cancel_on_fail(mut self, cancel_on_fail: bool) -> Self {
        self.cancel_on_fail = cancel_on_fail;
        self
    }
}

/// Which finalizer produced a [`RecordedError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Failed,
    Fatal,
}

/// One captured failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedError {
    pub kind: ErrorKind,
    pub message: String,
    /// Rendered error chain, when an error value accompanied the failure
    pub detail: Option<String>,
}

impl RecordedError {
    pub fn failed(message: impl Into<String>, error: Option<&anyhow::Error>) -> Self {
        Self {
            kind: ErrorKind::Failed,
            message: message.into(),
            detail: error.map(|e| format!("{e:#}")),
        }
    }

    pub fn fatal(message: impl Into<String>, error: Option<&anyhow::Error>) -> Self {
        Self {
            kind: ErrorKind::Fatal,
            message: message.into(),
            detail: error.map(|e| format!("{e:#}")),
        }
    }
}

/// A named test with its bound callable and shared runtime state
pub struct TestCase {
    handle: CaseHandle,
    callable: Option<TestFn>,
    receiver: Option<Arc<dyn Any + Send + Sync>>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, config: TestConfig) -> Self {
        Self {
            handle: CaseHandle::new(name.into(), config),
            callable: None,
            receiver: None,
        }
    }

    /// Bind the receiver and the method to call on it.
    ///
    /// May be repeated freely until the case is running.
    pub fn setup<R, F>(&mut self, receiver: Arc<R>, callable: F) -> Result<()>
    where
        R: Send + Sync + 'static,
        F: Fn(&R, &TestCase) -> TestResult + Send + Sync + 'static,
    {
        self.ensure_not_running()?;

        let bound = Arc::clone(&receiver);
        self.callable = Some(Arc::new(move |case: &TestCase| callable(bound.as_ref(), case)));
        self.receiver = Some(receiver);
        self.handle
            .set_declaring_type(short_type_name(std::any::type_name::<R>()).to_string());
        Ok(())
    }

    /// Bind a free-standing body with no receiver
    pub fn setup_fn<F>(&mut self, callable: F) -> Result<()>
    where
        F: Fn(&TestCase) -> TestResult + Send + Sync + 'static,
    {
        self.ensure_not_running()?;

        self.callable = Some(Arc::new(callable));
        self.receiver = None;
        self.handle.set_declaring_type("fn".to_string());
        Ok(())
    }

    fn ensure_not_running(&self) -> Result<()> {
        if self.handle.is_running() {
            return Err(TestbedError::AlreadyRunning(self.name()));
        }
        Ok(())
    }

    /// Invoke the bound callable.
    ///
    /// Accepted from `Pending` or any terminal status; a re-run clears the
    /// status and elapsed time but keeps previously recorded errors. Errors
    /// and panics escaping the body are captured here and force `Fatal`.
    pub fn run(&self) -> Result<TestStatus> {
        let callable = self
            .callable
            .clone()
            .ok_or_else(|| TestbedError::NotBound(self.name()))?;

        self.handle.start()?;

        match panic::catch_unwind(AssertUnwindSafe(|| callable(self))) {
            Ok(Ok(Completion::Finished)) => {
                self.handle.complete();
            }
            Ok(Ok(Completion::Deferred)) => {}
            Ok(Err(error)) => self.handle.escalate(error),
            Err(payload) => self.handle.escalate(anyhow::anyhow!(
                "test body panicked: {}",
                panic_message(payload.as_ref())
            )),
        }

        Ok(self.status())
    }

    pub fn handle(&self) -> &CaseHandle {
        &self.handle
    }

    pub fn name(&self) -> String {
        self.handle.name()
    }

    /// Short name of the receiver type, `fn` for free-standing bodies
    pub fn declaring_type(&self) -> String {
        self.handle.declaring_type()
    }

    /// The bound receiver, if it is an `R`
    pub fn receiver<R: Send + Sync + 'static>(&self) -> Option<Arc<R>> {
        self.receiver
            .as_ref()
            .and_then(|receiver| Arc::clone(receiver).downcast::<R>().ok())
    }

    pub fn is_bound(&self) -> bool {
        self.callable.is_some()
    }

    pub fn config(&self) -> TestConfig {
        self.handle.config()
    }

    pub fn channel(&self) -> i32 {
        self.handle.config().channel
    }

    pub fn status(&self) -> TestStatus {
        self.handle.status()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    pub fn elapsed(&self) -> Duration {
        self.handle.elapsed()
    }

    pub fn errors(&self) -> Vec<RecordedError> {
        self.handle.errors()
    }

    pub fn set_sink(&self, sink: Arc<dyn LogSink>) {
        self.handle.set_sink(sink);
    }

    pub fn complete(&self) -> bool {
        self.handle.complete()
    }

    pub fn fail(&self, message: impl Into<String>, error: Option<anyhow::Error>) -> bool {
        self.handle.fail(message, error)
    }

    pub fn fatal(&self, message: impl Into<String>, error: Option<anyhow::Error>) -> bool {
        self.handle.fatal(message, error)
    }

    pub fn timeout(&self) -> bool {
        self.handle.timeout()
    }

    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }

    pub fn poll(&self, elapsed: Duration) {
        self.handle.poll(elapsed);
    }

    pub fn run_check(&self) {
        self.handle.run_check();
    }

    pub fn should_cancel(&self) -> bool {
        self.handle.should_cancel()
    }

    pub fn reset(&self) {
        self.handle.reset();
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("handle", &self.handle)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// `my_crate::suites::LoginSuite` -> `LoginSuite`
pub(crate) fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
