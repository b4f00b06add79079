use serde::{Deserialize, Serialize};
use std::fmt;

/// Test case status definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Initial state: never run, or reset since the last run
    #[default]
    Pending,
    /// The bound callable has been invoked and has not settled yet
    Running,
    /// Test finished without a reported failure
    Complete,
    /// An assertion or explicit check reported a controlled failure
    Failed,
    /// An error escaped the test body, or a failure was escalated
    Fatal,
    /// Elapsed duration reached the configured ceiling while polling
    Timeout,
    /// Test was cancelled explicitly
    Canceled,
}

impl TestStatus {
    /// Check if this is a terminal state for the current execution
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Complete | Self::Failed | Self::Fatal | Self::Timeout | Self::Canceled
        )
    }

    /// Check if the test is currently executing
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Check if this is a failure outcome (anything terminal but `Complete`)
    pub fn is_failure(&self) -> bool {
        self.is_terminal() && !matches!(self, Self::Complete)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
            Self::Fatal => write!(f, "fatal"),
            Self::Timeout => write!(f, "timeout"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

impl std::str::FromStr for TestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "complete" => Ok(Self::Complete),
            "failed" => Ok(Self::Failed),
            "fatal" => Ok(Self::Fatal),
            "timeout" => Ok(Self::Timeout),
            "canceled" => Ok(Self::Canceled),
            _ => Err(format!("Invalid test status: {s}")),
        }
    }
}
