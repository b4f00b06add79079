#![allow(dead_code)]

pub mod strategies;

use std::sync::Arc;
use testbed::scheduler::{ManualClock, RunReport, Scheduler, Step, Suspension};
use testbed::test_case::{Completion, TestCase, TestConfig, TestResult};
use testbed::RecordingSink;

/// Scheduler wired to an in-memory sink and a clock the test controls
pub struct Harness {
    pub scheduler: Scheduler,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        let sink = Arc::new(RecordingSink::new());
        let clock = Arc::new(ManualClock::new());
        let scheduler = Scheduler::new()
            .with_sink(sink.clone())
            .with_clock(clock.clone());
        Self {
            scheduler,
            sink,
            clock,
        }
    }

    /// Step until the run finishes, collecting every suspension on the way
    pub fn drain(&mut self) -> (RunReport, Vec<Suspension>) {
        let mut suspensions = Vec::new();
        loop {
            match self.scheduler.step() {
                Step::Suspend(suspension) => suspensions.push(suspension),
                Step::Finished(report) => return (report, suspensions),
                Step::Idle => panic!("scheduler went idle without finishing"),
            }
        }
    }
}

/// Free-standing case bound to `body`, with its output captured
pub fn bound_case(
    name: &str,
    config: TestConfig,
    body: impl Fn(&TestCase) -> TestResult + Send + Sync + 'static,
) -> (TestCase, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let mut case = TestCase::new(name, config);
    case.setup_fn(body).expect("fresh case accepts a callable");
    case.set_sink(sink.clone());
    (case, sink)
}

pub fn finished<R>(_: &R, _: &TestCase) -> TestResult {
    Ok(Completion::Finished)
}

pub fn deferred<R>(_: &R, _: &TestCase) -> TestResult {
    Ok(Completion::Deferred)
}
