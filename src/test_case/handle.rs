use super::{RecordedError, TestConfig};
use crate::logging::{LogSink, Severity, TracingSink};
use crate::state_machine::{determine_target_state, TestEvent, TestStatus};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Shared, clonable view of one test case's runtime state.
///
/// The bound callable receives the owning [`TestCase`](super::TestCase); a body
/// that finishes its work after returning keeps a clone of this handle and
/// calls one of the finalizers from wherever that work completes.
#[derive(Clone)]
pub struct CaseHandle {
    inner: Arc<CaseInner>,
}

struct CaseInner {
    state: Mutex<CaseState>,
    sink: RwLock<Arc<dyn LogSink>>,
}

#[derive(Debug)]
struct CaseState {
    name: String,
    declaring_type: String,
    config: TestConfig,
    status: TestStatus,
    elapsed: Duration,
    errors: Vec<RecordedError>,
}

impl CaseState {
    /// `type.name|12ms|`, lowercased
    fn prefix(&self) -> String {
        format!(
            "{}.{}|{}ms|",
            self.declaring_type,
            self.name,
            self.elapsed.as_millis()
        )
        .to_lowercase()
    }
}

impl CaseHandle {
    pub(crate) fn new(name: String, config: TestConfig) -> Self {
        Self {
            inner: Arc::new(CaseInner {
                state: Mutex::new(CaseState {
                    name,
                    declaring_type: String::new(),
                    config,
                    status: TestStatus::default(),
                    elapsed: Duration::ZERO,
                    errors: Vec::new(),
                }),
                sink: RwLock::new(Arc::new(TracingSink)),
            }),
        }
    }

    pub fn name(&self) -> String {
        self.inner.state.lock().name.clone()
    }

    pub fn declaring_type(&self) -> String {
        self.inner.state.lock().declaring_type.clone()
    }

    pub fn config(&self) -> TestConfig {
        self.inner.state.lock().config
    }

    pub fn status(&self) -> TestStatus {
        self.inner.state.lock().status
    }

    pub fn is_running(&self) -> bool {
        self.status().is_active()
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.state.lock().elapsed
    }

    pub fn errors(&self) -> Vec<RecordedError> {
        self.inner.state.lock().errors.clone()
    }

    /// Replace the sink receiving this case's human-readable output
    pub fn set_sink(&self, sink: Arc<dyn LogSink>) {
        *self.inner.sink.write() = sink;
    }

    pub(crate) fn set_declaring_type(&self, declaring_type: String) {
        self.inner.state.lock().declaring_type = declaring_type;
    }

    /// Mark the test complete. No-op unless running.
    pub fn complete(&self) -> bool {
        self.finalize(TestEvent::Complete, None, |state| {
            (
                Severity::Info,
                format!("Complete - {} excp.", state.errors.len()),
            )
        })
    }

    /// Report a controlled failure. No-op unless running.
    pub fn fail(&self, message: impl Into<String>, error: Option<anyhow::Error>) -> bool {
        let message = message.into();
        let text = format!("Fail - {message}");
        self.finalize(TestEvent::Fail(message), error, move |_| (Severity::Error, text))
    }

    /// Report an escalated failure. No-op unless running.
    pub fn fatal(&self, message: impl Into<String>, error: Option<anyhow::Error>) -> bool {
        let message = message.into();
        let text = format!("Fatal - {message}");
        self.finalize(TestEvent::Fatal(message), error, move |_| (Severity::Error, text))
    }

    /// Mark the test timed out. No-op unless running.
    pub fn timeout(&self) -> bool {
        self.finalize(TestEvent::Timeout, None, |state| {
            (
                Severity::Warning,
                format!("Timed out >= {}ms", state.config.timeout_ms),
            )
        })
    }

    /// Cancel a pending or running test
    pub fn cancel(&self) -> bool {
        self.finalize(TestEvent::Cancel, None, |_| {
            (Severity::Warning, "Canceled".to_string())
        })
    }

    /// Record an error that escaped the test body and force `Fatal`
    pub(crate) fn escalate(&self, error: anyhow::Error) {
        let prefix = {
            let mut state = self.inner.state.lock();
            // a body may reset its own case before failing; escalation still applies
            state.status = determine_target_state(state.status, &TestEvent::Escalate)
                .unwrap_or(TestStatus::Fatal);
            state
                .errors
                .push(RecordedError::fatal("unhandled error in test body", Some(&error)));
            state.prefix()
        };
        self.emit(
            &format!("{prefix}  Fatal - unhandled error in test body"),
            Severity::Error,
            Some(&error),
        );
    }

    /// Transition to `Running` for a fresh execution
    pub(crate) fn start(&self) -> crate::error::Result<()> {
        let mut state = self.inner.state.lock();
        state.status = determine_target_state(state.status, &TestEvent::Start)?;
        state.elapsed = Duration::ZERO;
        Ok(())
    }

    /// Record the elapsed time for this execution and check the timeout.
    ///
    /// Elapsed time never moves backwards while running.
    pub fn poll(&self, elapsed: Duration) {
        {
            let mut state = self.inner.state.lock();
            if state.status != TestStatus::Running {
                return;
            }
            if elapsed > state.elapsed {
                state.elapsed = elapsed;
            }
        }
        self.run_check();
    }

    /// Check the recorded elapsed time against the timeout
    pub fn run_check(&self) {
        let expired = {
            let state = self.inner.state.lock();
            state.status == TestStatus::Running
                && state.config.timeout_ms > 0
                && state.elapsed >= Duration::from_millis(state.config.timeout_ms)
        };

        if expired {
            self.timeout();
        }
    }

    /// Whether the remainder of the owning bank should be abandoned
    pub fn should_cancel(&self) -> bool {
        let state = self.inner.state.lock();
        state.status == TestStatus::Fatal
            || (state.config.cancel_on_fail && state.status != TestStatus::Complete)
    }

    /// Return to `Pending`, clearing recorded errors and elapsed time
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        state.status = TestStatus::Pending;
        state.errors.clear();
        state.elapsed = Duration::ZERO;
    }

    /// Log an assertion outcome; failures also attempt the guarded `fail`.
    ///
    /// The diagnostic is emitted even when the case has already settled, so
    /// every assertion in a body shows up while only the first failure sticks.
    pub(crate) fn record_assertion(&self, passed: bool, text: String) -> bool {
        if passed {
            let prefix = self.inner.state.lock().prefix();
            self.emit(&format!("{prefix}assert|  {text}"), Severity::Warning, None);
            return true;
        }

        let prefix = {
            let mut state = self.inner.state.lock();
            let event = TestEvent::Fail(text.clone());
            if let Ok(next) = determine_target_state(state.status, &event) {
                state.status = next;
                state.errors.push(RecordedError::failed(text.clone(), None));
            }
            state.prefix()
        };
        self.emit(&format!("{prefix}assert|  {text}"), Severity::Error, None);
        false
    }

    /// Apply a guarded finalizer; logs only when the transition happened
    fn finalize<F>(&self, event: TestEvent, error: Option<anyhow::Error>, describe: F) -> bool
    where
        F: FnOnce(&CaseState) -> (Severity, String),
    {
        let (prefix, severity, text) = {
            let mut state = self.inner.state.lock();
            match determine_target_state(state.status, &event) {
                Ok(next) => state.status = next,
                Err(err) => {
                    trace!(
                        test = %state.name,
                        event = event.event_type(),
                        error = %err,
                        "Finalizer ignored"
                    );
                    return false;
                }
            }

            match &event {
                TestEvent::Fail(message) => state
                    .errors
                    .push(RecordedError::failed(message.clone(), error.as_ref())),
                TestEvent::Fatal(message) => state
                    .errors
                    .push(RecordedError::fatal(message.clone(), error.as_ref())),
                _ => {}
            }

            let (severity, text) = describe(&state);
            (state.prefix(), severity, text)
        };

        self.emit(&format!("{prefix}  {text}"), severity, error.as_ref());
        true
    }

    fn emit(&self, message: &str, severity: Severity, error: Option<&anyhow::Error>) {
        let sink = Arc::clone(&self.inner.sink.read());
        sink.log(message, severity, error);
    }
}

impl fmt::Debug for CaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("CaseHandle")
            .field("name", &state.name)
            .field("status", &state.status)
            .field("elapsed", &state.elapsed)
            .field("errors", &state.errors.len())
            .finish()
    }
}
