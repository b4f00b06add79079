// State machine module for test case execution
//
// Status definitions, the events that drive them, and the pure transition table
// every TestCase mutation goes through.

pub mod events;
pub mod states;
pub mod transitions;

// Re-export main types for convenient access
pub use events::TestEvent;
pub use states::TestStatus;
pub use transitions::determine_target_state;
