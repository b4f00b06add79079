use serde::{Deserialize, Serialize};

/// Events that can trigger test case status transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TestEvent {
    /// Invoke the bound callable
    Start,
    /// Mark the test as complete
    Complete,
    /// Controlled failure with a message
    Fail(String),
    /// Escalated failure with a message
    Fatal(String),
    /// Timeout ceiling reached while polling
    Timeout,
    /// An error escaped the test body during `run`
    Escalate,
    /// Explicit cancellation
    Cancel,
    /// Return to the initial state
    Reset,
}

impl TestEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Fail(_) => "fail",
            Self::Fatal(_) => "fatal",
            Self::Timeout => "timeout",
            Self::Escalate => "escalate",
            Self::Cancel => "cancel",
            Self::Reset => "reset",
        }
    }

    /// Extract the failure message if this is a failure event
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) | Self::Fatal(msg) => Some(msg),
            _ => None,
        }
    }

    /// Finalizers are only honoured while the test is running
    pub fn is_finalizer(&self) -> bool {
        matches!(
            self,
            Self::Complete | Self::Fail(_) | Self::Fatal(_) | Self::Timeout
        )
    }

    /// Create a failure event with the given message
    pub fn fail_with(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }

    /// Create a fatal event with the given message
    pub fn fatal_with(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }
}
