//! # Testbed Configuration
//!
//! Engine-wide settings: defaults applied to tests that do not declare their
//! own, pacing between cases, the host tick length used by the tokio driver,
//! and logging/event plumbing.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use testbed::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let delay = manager.config().inter_test_delay();
//! let defaults = manager.config().test_defaults();
//! # Ok(())
//! # }
//! ```

pub mod loader;

use crate::constants;
use crate::error::{Result, TestbedError};
use crate::test_case::TestConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use loader::ConfigManager;

/// Root configuration structure mirroring `config/testbed.toml`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TestbedConfig {
    /// Channel assigned to declarations without an explicit channel
    pub default_channel: i32,

    /// Timeout assigned to declarations without an explicit timeout (0 = none)
    pub default_timeout_ms: u64,

    /// Cancel-on-fail policy for declarations without an explicit policy
    pub default_cancel_on_fail: bool,

    /// Pause between cases of a bank; 0 means a single host tick
    pub inter_test_delay_ms: u64,

    /// Length of one host tick for the tokio tick driver
    pub tick_interval_ms: u64,

    /// Buffer size of the lifecycle event broadcast channel
    pub event_channel_capacity: usize,

    /// Emit JSON log lines instead of plain text
    pub json_logs: bool,
}

impl Default for TestbedConfig {
    fn default() -> Self {
        Self {
            default_channel: constants::DEFAULT_CHANNEL,
            default_timeout_ms: constants::DEFAULT_TIMEOUT_MS,
            default_cancel_on_fail: constants::DEFAULT_CANCEL_ON_FAIL,
            inter_test_delay_ms: 0,
            tick_interval_ms: constants::DEFAULT_TICK_INTERVAL_MS,
            event_channel_capacity: constants::DEFAULT_EVENT_CHANNEL_CAPACITY,
            json_logs: false,
        }
    }
}

impl TestbedConfig {
    /// Reject values the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.default_channel == constants::ALL_CHANNELS {
            return Err(TestbedError::ConfigurationError(format!(
                "default_channel cannot be {} (reserved for all channels)",
                constants::ALL_CHANNELS
            )));
        }

        if self.event_channel_capacity == 0 {
            return Err(TestbedError::ConfigurationError(
                "event_channel_capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn inter_test_delay(&self) -> Duration {
        Duration::from_millis(self.inter_test_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Per-test settings used when a declaration does not carry its own
    pub fn test_defaults(&self) -> TestConfig {
        TestConfig {
            channel: self.default_channel,
            timeout_ms: self.default_timeout_ms,
            cancel_on_fail: self.default_cancel_on_fail,
        }
    }
}
