//! # Registry Infrastructure
//!
//! Where banks come from and where they wait.
//!
//! ## Architecture
//!
//! ```text
//! Registry Infrastructure
//! ├── TestSuite / BankBuilder   (explicit test declaration -> TestBank)
//! └── ChannelRegistry           (channel id -> FIFO of TestBank)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use testbed::registry::{discover, ChannelRegistry, TestDeclaration, TestSuite};
//! use testbed::test_case::{Completion, TestConfig};
//! use testbed::{Assertions, ChannelSelector};
//!
//! struct Smoke;
//!
//! impl TestSuite for Smoke {
//!     fn declarations() -> Vec<TestDeclaration<Self>> {
//!         vec![TestDeclaration::new("boots", |_suite: &Smoke, case| {
//!             case.is_true(true);
//!             Ok(Completion::Finished)
//!         })]
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = ChannelRegistry::new();
//! for bank in discover(Arc::new(Smoke), ChannelSelector::All, &TestConfig::default())? {
//!     registry.enqueue(bank);
//! }
//! assert_eq!(registry.pending(ChannelSelector::All), 1);
//! # Ok(())
//! # }
//! ```

pub mod channels;
pub mod suite;

pub use channels::ChannelRegistry;
pub use suite::{discover, BankBuilder, TestDeclaration, TestSuite};
