//! # System Constants
//!
//! Channel sentinels, default test settings and lifecycle event names shared
//! across the engine.

/// Channel every test lands on unless configured otherwise.
pub const DEFAULT_CHANNEL: i32 = 1;

/// Selector value meaning "every channel". Never valid as a stored channel.
pub const ALL_CHANNELS: i32 = -1;

/// A timeout of zero disables timeout polling.
pub const DEFAULT_TIMEOUT_MS: u64 = 0;

pub const DEFAULT_CANCEL_ON_FAIL: bool = true;

/// Host tick length used by the tokio tick driver (~60 ticks per second).
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;

pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Lifecycle events published by the scheduler
pub mod events {
    pub const RUN_STARTED: &str = "testbed.run_started";
    pub const RUN_FINISHED: &str = "testbed.run_finished";

    pub const BANK_STARTED: &str = "testbed.bank_started";
    pub const BANK_CANCELLED: &str = "testbed.bank_cancelled";
    pub const BANK_COMPLETED: &str = "testbed.bank_completed";

    pub const CASE_FINISHED: &str = "testbed.case_finished";
}

/// Environment variables consulted by the config loader and logging setup
pub mod env {
    pub const ENVIRONMENT: &str = "TESTBED_ENV";
    pub const CONFIG_PATH: &str = "TESTBED_CONFIG";
    pub const OVERRIDE_PREFIX: &str = "TESTBED";
    pub const OVERRIDE_SEPARATOR: &str = "__";
}
