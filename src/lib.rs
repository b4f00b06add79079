#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Testbed Core
//!
//! In-process test orchestration engine that runs cooperatively inside a host
//! application's tick loop.
//!
//! ## Overview
//!
//! Tests are declared explicitly against a receiver type, grouped into
//! ordered [`TestBank`]s per channel, queued in a [`ChannelRegistry`], and
//! drained by a [`Scheduler`] that advances one step per host tick. Nothing
//! here blocks the host: a running case is polled once per tick for its
//! timeout, and control returns to the host between cases and after each bank.
//!
//! ## Module Organization
//!
//! - [`test_case`] - Test case state machine, shared handles and assertions
//! - [`state_machine`] - Status definitions and the transition table
//! - [`bank`] - Test banks, channels and channel selectors
//! - [`registry`] - Explicit test declaration and the per-channel bank queues
//! - [`scheduler`] - Cooperative run loop, clocks, tick drivers and reports
//! - [`events`] - Lifecycle event broadcasting
//! - [`logging`] - Tracing setup and the human-readable output sink
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use testbed::registry::{discover, TestDeclaration, TestSuite};
//! use testbed::scheduler::{Scheduler, TokioTickDriver};
//! use testbed::test_case::Completion;
//! use testbed::{Assertions, ChannelSelector, TestbedConfig};
//!
//! struct Checkout {
//!     cart_limit: usize,
//! }
//!
//! impl TestSuite for Checkout {
//!     fn declarations() -> Vec<TestDeclaration<Self>> {
//!         vec![TestDeclaration::new("limit_is_sane", |suite: &Checkout, case| {
//!             case.is_true(suite.cart_limit > 0);
//!             Ok(Completion::Finished)
//!         })]
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TestbedConfig::default();
//! testbed::logging::init_structured_logging_from(&config);
//! let mut scheduler = Scheduler::from_config(&config);
//! for bank in discover(Arc::new(Checkout { cart_limit: 50 }), ChannelSelector::All, &config.test_defaults())? {
//!     scheduler.enqueue(bank);
//! }
//!
//! let driver = TokioTickDriver::from_config(&config);
//! if let Some(report) = scheduler
//!     .run_to_completion(config.inter_test_delay(), ChannelSelector::All, &driver)
//!     .await
//! {
//!     println!("{} attempted, {} failed", report.total_attempted(), report.total_failures());
//! }
//! # Ok(())
//! # }
//! ```

pub mod bank;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod registry;
pub mod scheduler;
pub mod state_machine;
pub mod test_case;

pub use bank::{Channel, ChannelSelector, TestBank};
pub use config::{ConfigManager, TestbedConfig};
pub use error::{Result, TestbedError};
pub use logging::{LogSink, RecordingSink, Severity, TracingSink};
pub use registry::{discover, BankBuilder, ChannelRegistry, TestDeclaration, TestSuite};
pub use scheduler::{RunReport, Scheduler, Step, Suspension, TickDriver, TokioTickDriver};
pub use state_machine::{TestEvent, TestStatus};
pub use test_case::{Assertions, CaseHandle, Completion, TestCase, TestConfig, TestResult};
