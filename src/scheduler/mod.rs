//! # Cooperative Scheduler
//!
//! Drains queued banks and executes their cases one step at a time alongside
//! the host's own per-tick work.
//!
//! ## Execution model
//!
//! The scheduler never blocks. [`Scheduler::step`] advances the active run
//! until the next suspension point and returns it to the host:
//!
//! - once per host tick while a case is `Running` (timeout polling granularity)
//! - once between cases (a single tick, or the configured delay)
//! - once after each bank's summary
//!
//! Hosts either call `step` from their own tick loop, or hand a
//! [`TickDriver`] to [`Scheduler::drive`].
//!
//! ## Timeouts are observed, not enforced
//!
//! A case's timeout is checked only when the scheduler gets to poll it. A
//! body that never returns from `run` keeps the host thread and its timeout
//! is never observed; deferred bodies must return promptly and finish their
//! work across ticks.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use testbed::registry::BankBuilder;
//! use testbed::scheduler::{Scheduler, Step};
//! use testbed::test_case::Completion;
//! use testbed::ChannelSelector;
//!
//! let bank = BankBuilder::new("smoke", Arc::new(()))
//!     .test("boots", |_: &(), _| Ok(Completion::Finished))
//!     .build()
//!     .unwrap();
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.enqueue(bank);
//! assert!(scheduler.run(Duration::ZERO, ChannelSelector::All));
//!
//! let report = loop {
//!     match scheduler.step() {
//!         Step::Suspend(_) => continue,
//!         Step::Finished(report) => break report,
//!         Step::Idle => unreachable!(),
//!     }
//! };
//! assert!(report.is_success());
//! ```

pub mod clock;
pub mod driver;
pub mod report;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use driver::{Suspension, TickDriver, TokioTickDriver};
pub use report::{BankReport, CaseReport, RunReport};

use crate::bank::{ChannelSelector, TestBank};
use crate::config::TestbedConfig;
use crate::constants::events;
use crate::events::EventPublisher;
use crate::logging::{LogSink, Severity, TracingSink};
use crate::registry::ChannelRegistry;
use report::duration_millis;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of advancing the scheduler
#[derive(Debug)]
pub enum Step {
    /// Call `step` again once the host has honoured the suspension
    Suspend(Suspension),
    /// The run drained every bank; the scheduler is idle again
    Finished(RunReport),
    /// No run is active
    Idle,
}

/// Owns the channel registry and the single active run
pub struct Scheduler {
    registry: ChannelRegistry,
    sink: Arc<dyn LogSink>,
    clock: Arc<dyn Clock>,
    publisher: EventPublisher,
    default_delay: Duration,
    active: Option<ActiveRun>,
}

struct ActiveRun {
    run_id: Uuid,
    delay: Duration,
    banks: VecDeque<TestBank>,
    current: Option<BankCursor>,
    reports: Vec<BankReport>,
}

struct BankCursor {
    bank: TestBank,
    index: usize,
    attempted: usize,
    completed: usize,
    cancelled: bool,
    phase: BankPhase,
}

#[derive(Debug, Clone, Copy)]
enum BankPhase {
    /// Start the case at `index`, or summarize when past the end
    Starting,
    /// Case at `index` was started at `started_at`
    Polling { started_at: Instant },
    /// Emit the summary and release the bank
    Summarizing,
}

impl BankCursor {
    fn new(bank: TestBank) -> Self {
        Self {
            bank,
            index: 0,
            attempted: 0,
            completed: 0,
            cancelled: false,
            phase: BankPhase::Starting,
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            registry: ChannelRegistry::new(),
            sink: Arc::new(TracingSink),
            clock: Arc::new(MonotonicClock),
            publisher: EventPublisher::default(),
            default_delay: Duration::ZERO,
            active: None,
        }
    }

    pub fn from_config(config: &TestbedConfig) -> Self {
        Self {
            publisher: EventPublisher::new(config.event_channel_capacity),
            default_delay: config.inter_test_delay(),
            ..Self::new()
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_publisher(mut self, publisher: EventPublisher) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Queue a bank for a later run
    pub fn enqueue(&mut self, bank: TestBank) {
        self.registry.enqueue(bank);
    }

    /// Discard queued banks; banks already drained into a run are unaffected
    pub fn clear(&mut self, selector: impl Into<ChannelSelector>) {
        self.registry.clear(selector);
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Start a run over the selected channel(s).
    ///
    /// Returns `false` without doing anything when a run is already active.
    /// The selected queues are drained immediately; banks enqueued later wait
    /// for the next run.
    pub fn run(&mut self, delay: Duration, selector: impl Into<ChannelSelector>) -> bool {
        let selector = selector.into();
        if self.active.is_some() {
            debug!(selector = %selector, "Run already active - ignoring run request");
            return false;
        }

        let banks: VecDeque<TestBank> = self.registry.drain(selector).into();
        let run_id = Uuid::new_v4();

        info!(
            run_id = %run_id,
            selector = %selector,
            banks = banks.len(),
            delay_ms = duration_millis(delay),
            "Test run started"
        );
        self.publisher.publish(
            events::RUN_STARTED,
            json!({ "run_id": run_id, "selector": selector.to_string(), "banks": banks.len() }),
        );

        self.active = Some(ActiveRun {
            run_id,
            delay,
            banks,
            current: None,
            reports: Vec::new(),
        });
        true
    }

    /// Start a run using the configured inter-test delay
    pub fn run_default(&mut self, selector: impl Into<ChannelSelector>) -> bool {
        self.run(self.default_delay, selector)
    }

    /// Advance the active run to its next suspension point
    pub fn step(&mut self) -> Step {
        let Some(mut run) = self.active.take() else {
            return Step::Idle;
        };

        match self.advance(&mut run) {
            Some(suspension) => {
                self.active = Some(run);
                Step::Suspend(suspension)
            }
            None => Step::Finished(self.finish(run)),
        }
    }

    /// Step the active run to completion, suspending through `driver`
    pub async fn drive(&mut self, driver: &dyn TickDriver) -> Option<RunReport> {
        loop {
            match self.step() {
                Step::Suspend(suspension) => driver.suspend(suspension).await,
                Step::Finished(report) => return Some(report),
                Step::Idle => return None,
            }
        }
    }

    /// `run` followed by `drive`; `None` when a run was already active
    pub async fn run_to_completion(
        &mut self,
        delay: Duration,
        selector: impl Into<ChannelSelector>,
        driver: &dyn TickDriver,
    ) -> Option<RunReport> {
        if !self.run(delay, selector) {
            return None;
        }
        self.drive(driver).await
    }

    fn advance(&self, run: &mut ActiveRun) -> Option<Suspension> {
        loop {
            let Some(cursor) = run.current.as_mut() else {
                let bank = run.banks.pop_front()?;
                self.begin_bank(run.run_id, &bank);
                run.current = Some(BankCursor::new(bank));
                continue;
            };

            match cursor.phase {
                BankPhase::Starting => {
                    let Some(case) = cursor.bank.get(cursor.index) else {
                        cursor.phase = BankPhase::Summarizing;
                        continue;
                    };

                    case.set_sink(Arc::clone(&self.sink));
                    let started_at = self.clock.now();
                    cursor.attempted += 1;
                    if let Err(err) = case.run() {
                        warn!(
                            context = %cursor.bank.context(),
                            test = %case.name(),
                            error = %err,
                            "Test could not be started"
                        );
                    }
                    cursor.phase = BankPhase::Polling { started_at };
                }
                BankPhase::Polling { started_at } => {
                    let Some(case) = cursor.bank.get(cursor.index) else {
                        cursor.phase = BankPhase::Summarizing;
                        continue;
                    };

                    if case.is_running() {
                        case.poll(self.clock.now().saturating_duration_since(started_at));
                        return Some(Suspension::NextTick);
                    }

                    self.publisher.publish(
                        events::CASE_FINISHED,
                        json!({
                            "run_id": run.run_id,
                            "context": cursor.bank.context(),
                            "test": case.name(),
                            "status": case.status(),
                            "elapsed_ms": duration_millis(case.elapsed()),
                        }),
                    );

                    if case.should_cancel() {
                        self.sink.log(
                            &format!(
                                "cancelled due to {} status - context: {}",
                                case.status(),
                                cursor.bank.context()
                            ),
                            Severity::Error,
                            None,
                        );
                        self.publisher.publish(
                            events::BANK_CANCELLED,
                            json!({
                                "run_id": run.run_id,
                                "context": cursor.bank.context(),
                                "test": case.name(),
                                "status": case.status(),
                            }),
                        );
                        cursor.cancelled = true;
                        cursor.phase = BankPhase::Summarizing;
                        continue;
                    }

                    cursor.completed += 1;
                    cursor.index += 1;
                    cursor.phase = BankPhase::Starting;

                    return Some(if run.delay > Duration::ZERO {
                        Suspension::Delay(run.delay)
                    } else {
                        Suspension::NextTick
                    });
                }
                BankPhase::Summarizing => {
                    let finished = run.current.take()?;
                    run.reports.push(self.end_bank(run.run_id, finished));
                    return Some(Suspension::NextTick);
                }
            }
        }
    }

    fn begin_bank(&self, run_id: Uuid, bank: &TestBank) {
        self.sink.log(
            &format!("initialized testbed - context: {}", bank.context()),
            Severity::Info,
            None,
        );
        self.publisher.publish(
            events::BANK_STARTED,
            json!({
                "run_id": run_id,
                "context": bank.context(),
                "channel": bank.channel().id(),
                "total": bank.count(),
            }),
        );
    }

    fn end_bank(&self, run_id: Uuid, cursor: BankCursor) -> BankReport {
        let total = cursor.bank.count();
        self.sink.log(
            &format!(
                "completed {} out of {} {} ({} attempted) - context: {}",
                cursor.completed,
                total,
                if total == 1 { "test" } else { "tests" },
                cursor.attempted,
                cursor.bank.context()
            ),
            Severity::Info,
            None,
        );

        let report = BankReport::new(
            &cursor.bank,
            cursor.attempted,
            cursor.completed,
            cursor.cancelled,
        );
        self.publisher.publish(
            events::BANK_COMPLETED,
            json!({
                "run_id": run_id,
                "context": report.context,
                "channel": report.channel,
                "total": report.total,
                "attempted": report.attempted,
                "completed": report.completed,
                "cancelled": report.cancelled,
            }),
        );
        report
    }

    fn finish(&self, run: ActiveRun) -> RunReport {
        let report = RunReport {
            run_id: run.run_id,
            banks: run.reports,
        };

        info!(
            run_id = %report.run_id,
            banks = report.banks.len(),
            attempted = report.total_attempted(),
            failures = report.total_failures(),
            "Test run finished"
        );
        self.publisher.publish(
            events::RUN_FINISHED,
            json!({
                "run_id": report.run_id,
                "banks": report.banks.len(),
                "attempted": report.total_attempted(),
                "failures": report.total_failures(),
            }),
        );
        report
    }
}
