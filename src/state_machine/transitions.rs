use super::{events::TestEvent, states::TestStatus};
use crate::error::{Result, TestbedError};

/// Determine the target status for `event` applied in `current`.
///
/// Every finalizer is guarded on `Running`, so at most one finalizing
/// transition happens per run. `Start` is accepted from `Pending` and from any
/// terminal status (re-run without reset). `Escalate` is applied when an
/// error escapes the test body and overrides whatever the body settled on,
/// including a body that reset its own case before failing.
pub fn determine_target_state(current: TestStatus, event: &TestEvent) -> Result<TestStatus> {
    let target = match (current, event) {
        // Start transitions
        (TestStatus::Pending, TestEvent::Start) => TestStatus::Running,
        (from, TestEvent::Start) if from.is_terminal() => TestStatus::Running,

        // Guarded finalizers
        (TestStatus::Running, TestEvent::Complete) => TestStatus::Complete,
        (TestStatus::Running, TestEvent::Fail(_)) => TestStatus::Failed,
        (TestStatus::Running, TestEvent::Fatal(_)) => TestStatus::Fatal,
        (TestStatus::Running, TestEvent::Timeout) => TestStatus::Timeout,

        // Body error caught at the run boundary
        (_, TestEvent::Escalate) => TestStatus::Fatal,

        // Cancellation
        (TestStatus::Pending | TestStatus::Running, TestEvent::Cancel) => TestStatus::Canceled,

        (_, TestEvent::Reset) => TestStatus::Pending,

        (from, event) => {
            return Err(TestbedError::InvalidTransition {
                from: from.to_string(),
                event: event.event_type().to_string(),
            })
        }
    };

    Ok(target)
}
