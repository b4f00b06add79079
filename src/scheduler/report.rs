use crate::bank::TestBank;
use crate::state_machine::TestStatus;
use crate::test_case::{RecordedError, TestCase};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Whole milliseconds in `duration`, saturating at `u64::MAX`
pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Final state of one test case after its bank finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseReport {
    pub name: String,
    pub declaring_type: String,
    pub status: TestStatus,
    pub elapsed_ms: u64,
    pub errors: Vec<RecordedError>,
}

impl CaseReport {
    pub fn from_case(case: &TestCase) -> Self {
        Self {
            name: case.name(),
            declaring_type: case.declaring_type(),
            status: case.status(),
            elapsed_ms: duration_millis(case.elapsed()),
            errors: case.errors(),
        }
    }
}

/// Outcome of draining one bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankReport {
    pub context: String,
    pub channel: i32,
    /// Number of cases in the bank
    pub total: usize,
    /// Cases whose callable was invoked
    pub attempted: usize,
    /// Cases that settled without triggering cancellation
    pub completed: usize,
    /// Whether the remainder of the bank was abandoned
    pub cancelled: bool,
    /// Every case in bank order, including ones never run
    pub cases: Vec<CaseReport>,
}

impl BankReport {
    pub(crate) fn new(bank: &TestBank, attempted: usize, completed: usize, cancelled: bool) -> Self {
        Self {
            context: bank.context().to_string(),
            channel: bank.channel().id(),
            total: bank.count(),
            attempted,
            completed,
            cancelled,
            cases: bank.iter().map(CaseReport::from_case).collect(),
        }
    }

    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|case| case.name == name)
    }

    /// Cases that ran and ended in anything other than `Complete`
    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|case| case.status.is_failure())
    }
}

/// Outcome of one scheduler run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub banks: Vec<BankReport>,
}

impl RunReport {
    pub fn total_attempted(&self) -> usize {
        self.banks.iter().map(|bank| bank.attempted).sum()
    }

    pub fn total_failures(&self) -> usize {
        self.banks.iter().map(|bank| bank.failures().count()).sum()
    }

    pub fn bank(&self, context: &str) -> Option<&BankReport> {
        self.banks.iter().find(|bank| bank.context == context)
    }

    /// Every attempted case completed and no bank was cancelled
    pub fn is_success(&self) -> bool {
        self.banks
            .iter()
            .all(|bank| !bank.cancelled && bank.failures().next().is_none())
    }
}
