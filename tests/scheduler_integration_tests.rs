//! Scheduler Integration Tests
//!
//! End-to-end runs through the public API: banks built from declarations,
//! queued per channel, and drained step by step or through a tick driver.

mod common;

use common::{deferred, finished, Harness};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use testbed::constants::events;
use testbed::registry::{discover, BankBuilder, TestDeclaration, TestSuite};
use testbed::scheduler::{Scheduler, Step, Suspension, TokioTickDriver};
use testbed::test_case::{CaseHandle, Completion, TestCase, TestConfig, TestResult};
use testbed::{Assertions, Channel, ChannelSelector, RecordingSink, Severity, TestStatus};

/// Receiver that remembers which bodies ran, in order
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<String>>,
}

impl Recorder {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

fn record(name: &'static str) -> impl Fn(&Recorder, &TestCase) -> TestResult + Send + Sync + 'static {
    move |recorder: &Recorder, _: &TestCase| {
        recorder.calls.lock().push(name.to_string());
        Ok(Completion::Finished)
    }
}

fn record_and_fail(
    name: &'static str,
) -> impl Fn(&Recorder, &TestCase) -> TestResult + Send + Sync + 'static {
    move |recorder: &Recorder, case: &TestCase| {
        recorder.calls.lock().push(name.to_string());
        case.fail("expected failure", None);
        Ok(Completion::Finished)
    }
}

#[test]
fn banks_run_fifo_within_a_channel_and_by_ascending_channel_overall() {
    let recorder = Arc::new(Recorder::default());
    let on_two = TestConfig::default().with_channel(2);
    let mut harness = Harness::new();

    harness.scheduler.enqueue(
        BankBuilder::new("late_channel", recorder.clone())
            .test_with("c", on_two, record("c"))
            .build()
            .unwrap(),
    );
    harness.scheduler.enqueue(
        BankBuilder::new("first", recorder.clone())
            .test("a1", record("a1"))
            .test("a2", record("a2"))
            .build()
            .unwrap(),
    );
    harness.scheduler.enqueue(
        BankBuilder::new("second", recorder.clone())
            .test("b", record("b"))
            .build()
            .unwrap(),
    );

    assert!(harness.scheduler.run(Duration::ZERO, ChannelSelector::All));
    let (report, _) = harness.drain();

    assert_eq!(recorder.calls(), vec!["a1", "a2", "b", "c"]);
    let contexts: Vec<&str> = report.banks.iter().map(|b| b.context.as_str()).collect();
    assert_eq!(contexts, vec!["first", "second", "late_channel"]);
    assert!(harness.scheduler.registry().is_empty());
}

#[test]
fn failing_case_short_circuits_its_bank() {
    let recorder = Arc::new(Recorder::default());
    let mut harness = Harness::new();
    harness.scheduler.enqueue(
        BankBuilder::new("checkout", recorder.clone())
            .test("t1", record_and_fail("t1"))
            .test("t2", record("t2"))
            .build()
            .unwrap(),
    );

    harness.scheduler.run(Duration::ZERO, 1);
    let (report, _) = harness.drain();
    let bank = report.bank("checkout").unwrap();

    assert_eq!(recorder.calls(), vec!["t1"]);
    assert!(bank.cancelled);
    assert_eq!(bank.attempted, 1);
    assert_eq!(bank.completed, 0);
    assert_eq!(bank.total, 2);
    assert_eq!(bank.case("t1").unwrap().status, TestStatus::Failed);
    assert_eq!(bank.case("t2").unwrap().status, TestStatus::Pending);
    assert!(!report.is_success());

    let cancelled = harness.sink.matching("cancelled due to failed status - context: checkout");
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].severity, Severity::Error);
    assert_eq!(
        harness.sink.matching("completed 0 out of 2 tests (1 attempted)").len(),
        1
    );
}

#[test]
fn lenient_failure_lets_the_bank_continue() {
    let recorder = Arc::new(Recorder::default());
    let lenient = TestConfig::default().with_cancel_on_fail(false);
    let mut harness = Harness::new();
    harness.scheduler.enqueue(
        BankBuilder::new("lenient", recorder.clone())
            .with_defaults(lenient)
            .test("t1", record_and_fail("t1"))
            .test("t2", record("t2"))
            .build()
            .unwrap(),
    );

    harness.scheduler.run(Duration::ZERO, ChannelSelector::All);
    let (report, _) = harness.drain();
    let bank = &report.banks[0];

    assert_eq!(recorder.calls(), vec!["t1", "t2"]);
    assert!(!bank.cancelled);
    assert_eq!(bank.completed, 2);
    assert_eq!(bank.failures().count(), 1);
    assert_eq!(report.total_failures(), 1);
}

#[test]
fn fatal_cancels_regardless_of_policy() {
    let recorder = Arc::new(Recorder::default());
    let lenient = TestConfig::default().with_cancel_on_fail(false);
    let mut harness = Harness::new();
    harness.scheduler.enqueue(
        BankBuilder::new("explodes", recorder.clone())
            .with_defaults(lenient)
            .test("boom", |_: &Recorder, _| anyhow::bail!("connection reset"))
            .test("after", record("after"))
            .build()
            .unwrap(),
    );

    harness.scheduler.run(Duration::ZERO, ChannelSelector::All);
    let (report, _) = harness.drain();
    let bank = &report.banks[0];

    assert!(recorder.calls().is_empty());
    assert!(bank.cancelled);
    let boom = bank.case("boom").unwrap();
    assert_eq!(boom.status, TestStatus::Fatal);
    assert_eq!(boom.errors[0].detail.as_deref(), Some("connection reset"));
    assert_eq!(harness.sink.matching("cancelled due to fatal status").len(), 1);
}

#[test]
fn single_channel_run_leaves_other_channels_queued() {
    let recorder = Arc::new(Recorder::default());
    let mut harness = Harness::new();
    harness.scheduler.enqueue(
        BankBuilder::new("one", recorder.clone())
            .test("a", record("a"))
            .build()
            .unwrap(),
    );
    harness.scheduler.enqueue(
        BankBuilder::new("three", recorder.clone())
            .test_with("b", TestConfig::default().with_channel(3), record("b"))
            .build()
            .unwrap(),
    );

    harness.scheduler.run(Duration::ZERO, 3);
    let (report, _) = harness.drain();

    assert_eq!(report.banks.len(), 1);
    assert_eq!(recorder.calls(), vec!["b"]);
    assert_eq!(harness.scheduler.registry().pending(Channel::DEFAULT), 1);

    harness.scheduler.clear(ChannelSelector::All);
    assert!(harness.scheduler.registry().is_empty());
}

#[test]
fn running_an_unknown_channel_finishes_empty() {
    let mut harness = Harness::new();
    assert!(harness.scheduler.run(Duration::ZERO, 42));
    let (report, suspensions) = harness.drain();
    assert!(report.banks.is_empty());
    assert!(suspensions.is_empty());
}

#[test]
fn second_run_is_rejected_until_the_first_finishes() {
    let mut harness = Harness::new();
    harness.scheduler.enqueue(
        BankBuilder::new("slow", Arc::new(()))
            .test("waits", deferred)
            .build()
            .unwrap(),
    );

    assert!(harness.scheduler.run(Duration::ZERO, ChannelSelector::All));
    assert!(matches!(
        harness.scheduler.step(),
        Step::Suspend(Suspension::NextTick)
    ));
    assert!(!harness.scheduler.run(Duration::ZERO, ChannelSelector::All));
    assert!(!harness.scheduler.run_default(1));
    assert!(harness.scheduler.is_running());
}

/// Receiver that stashes the handle of a deferred case
#[derive(Default)]
struct Deferred {
    handle: Mutex<Option<CaseHandle>>,
}

#[test]
fn deferred_case_completes_through_a_stashed_handle() {
    let receiver = Arc::new(Deferred::default());
    let mut harness = Harness::new();
    harness.scheduler.enqueue(
        BankBuilder::new("async_work", receiver.clone())
            .test("handshake", |receiver: &Deferred, case| {
                *receiver.handle.lock() = Some(case.handle().clone());
                Ok(Completion::Deferred)
            })
            .test("after", finished)
            .build()
            .unwrap(),
    );

    harness.scheduler.run(Duration::ZERO, ChannelSelector::All);
    for _ in 0..3 {
        assert!(matches!(
            harness.scheduler.step(),
            Step::Suspend(Suspension::NextTick)
        ));
        harness.clock.advance(Duration::from_millis(16));
    }

    let handle = receiver.handle.lock().take().unwrap();
    assert_eq!(handle.status(), TestStatus::Running);
    handle.is_equal(&"ack", &"ack");
    assert!(handle.complete());

    let (report, _) = harness.drain();
    let bank = &report.banks[0];
    assert_eq!(bank.case("handshake").unwrap().status, TestStatus::Complete);
    assert_eq!(bank.case("handshake").unwrap().elapsed_ms, 32);
    assert_eq!(bank.case("after").unwrap().status, TestStatus::Complete);
    assert_eq!(bank.completed, 2);
}

#[test]
fn assertions_inside_a_bank_settle_on_the_first_failure() {
    let mut harness = Harness::new();
    harness.scheduler.enqueue(
        BankBuilder::new("math", Arc::new(()))
            .test("arith", |_: &(), case| {
                case.is_equal(&4, &(2 + 2));
                case.is_true(1 > 2);
                case.is_null(&Some("still logged"));
                Ok(Completion::Finished)
            })
            .build()
            .unwrap(),
    );

    harness.scheduler.run(Duration::ZERO, ChannelSelector::All);
    let (report, _) = harness.drain();
    let arith = report.banks[0].case("arith").unwrap();

    assert_eq!(arith.status, TestStatus::Failed);
    assert_eq!(arith.errors.len(), 1);
    assert!(arith.errors[0].message.contains("IsTrue failed"));
    assert_eq!(harness.sink.matching("assert|").len(), 3);
}

struct Inventory {
    stock: u32,
}

impl TestSuite for Inventory {
    fn declarations() -> Vec<TestDeclaration<Self>> {
        vec![
            TestDeclaration::new("has_stock", |inventory: &Inventory, case| {
                case.is_true(inventory.stock > 0);
                Ok(Completion::Finished)
            }),
            TestDeclaration::new("audit", |_: &Inventory, _| Ok(Completion::Finished))
                .with_config(TestConfig::default().with_channel(7)),
        ]
    }
}

#[test]
fn discovered_suites_split_by_channel() {
    let suite = Arc::new(Inventory { stock: 3 });
    let banks = discover(suite.clone(), ChannelSelector::All, &TestConfig::default()).unwrap();
    assert_eq!(banks.len(), 2);
    assert_eq!(banks[0].context(), "Inventory");

    let only_seven = discover(suite, 7.into(), &TestConfig::default()).unwrap();
    assert_eq!(only_seven.len(), 1);
    assert_eq!(only_seven[0].get(0).unwrap().name(), "audit");

    let mut harness = Harness::new();
    for bank in banks {
        harness.scheduler.enqueue(bank);
    }
    harness.scheduler.run(Duration::ZERO, ChannelSelector::All);
    let (report, _) = harness.drain();
    assert!(report.is_success());
    assert_eq!(report.total_attempted(), 2);
}

#[test]
fn lifecycle_events_are_published_in_order() {
    let mut harness = Harness::new();
    let mut events_rx = harness.scheduler.publisher().subscribe();
    harness.scheduler.enqueue(
        BankBuilder::new("observed", Arc::new(()))
            .test("only", finished)
            .build()
            .unwrap(),
    );

    harness.scheduler.run(Duration::ZERO, ChannelSelector::All);
    let (report, _) = harness.drain();

    let mut names = Vec::new();
    while let Ok(event) = events_rx.try_recv() {
        assert_eq!(event.context["run_id"], serde_json::json!(report.run_id));
        names.push(event.name);
    }
    assert_eq!(
        names,
        vec![
            events::RUN_STARTED,
            events::BANK_STARTED,
            events::CASE_FINISHED,
            events::BANK_COMPLETED,
            events::RUN_FINISHED,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn tokio_driver_honours_inter_test_delay() {
    let sink = Arc::new(RecordingSink::new());
    let mut scheduler = Scheduler::new().with_sink(sink.clone());
    scheduler.enqueue(
        BankBuilder::new("paced", Arc::new(()))
            .test("a", finished)
            .test("b", finished)
            .test("c", finished)
            .build()
            .unwrap(),
    );

    let driver = TokioTickDriver::new(Duration::from_millis(16));
    let start = tokio::time::Instant::now();
    let report = scheduler
        .run_to_completion(Duration::from_millis(250), ChannelSelector::All, &driver)
        .await
        .unwrap();

    assert_eq!(report.banks[0].completed, 3);
    assert!(start.elapsed() >= Duration::from_millis(750));
    assert!(!scheduler.is_running());
    assert_eq!(sink.count(Severity::Info), 5);
}

#[tokio::test(start_paused = true)]
async fn deferred_case_finished_by_a_spawned_task() {
    let mut scheduler = Scheduler::new().with_sink(Arc::new(RecordingSink::new()));
    scheduler.enqueue(
        BankBuilder::new("spawned", Arc::new(()))
            .test("background", |_: &(), case| {
                let handle = case.handle().clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    handle.complete();
                });
                Ok(Completion::Deferred)
            })
            .build()
            .unwrap(),
    );

    let driver = TokioTickDriver::new(Duration::from_millis(16));
    let report = scheduler
        .run_to_completion(Duration::ZERO, ChannelSelector::All, &driver)
        .await
        .unwrap();

    let case = report.banks[0].case("background").unwrap();
    assert_eq!(case.status, TestStatus::Complete);
    assert!(report.is_success());
}

#[test]
fn drive_on_an_idle_scheduler_returns_nothing() {
    let mut scheduler = Scheduler::new();
    let driver = TokioTickDriver::new(Duration::ZERO);
    assert!(tokio_test::block_on(scheduler.drive(&driver)).is_none());
}
