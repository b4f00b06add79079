use thiserror::Error;

/// Errors raised by the orchestration engine itself.
///
/// Failures inside test bodies are never reported through this type; they are
/// captured on the owning [`TestCase`](crate::test_case::TestCase) instead.
#[derive(Debug, Error)]
pub enum TestbedError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] ::config::ConfigError),

    #[error("Invalid channel {0}: -1 is reserved for the all-channels selector")]
    InvalidChannel(i32),

    #[error("Channel mismatch: test '{test}' is on channel {test_channel}, bank is on channel {bank_channel}")]
    ChannelMismatch {
        test: String,
        test_channel: i32,
        bank_channel: i32,
    },

    #[error("Invalid state transition from {from} on event {event}")]
    InvalidTransition { from: String, event: String },

    #[error("Test '{0}' has no bound callable; call setup first")]
    NotBound(String),

    #[error("Test '{name}' is in state {status}; reset it before adding it to a bank")]
    NotReset { name: String, status: String },

    #[error("Test '{0}' is running and cannot be rebound")]
    AlreadyRunning(String),
}

pub type Result<T> = std::result::Result<T, TestbedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TestbedError::InvalidChannel(-1);
        assert_eq!(
            err.to_string(),
            "Invalid channel -1: -1 is reserved for the all-channels selector"
        );

        let err = TestbedError::ChannelMismatch {
            test: "login".to_string(),
            test_channel: 2,
            bank_channel: 1,
        };
        assert!(err.to_string().contains("'login' is on channel 2"));
    }
}
