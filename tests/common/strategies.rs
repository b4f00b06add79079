use proptest::prelude::*;
use testbed::test_case::TestConfig;
use testbed::TestStatus;

/// Something that can happen to a case after it has been started
#[derive(Debug, Clone)]
pub enum CaseAction {
    Complete,
    Fail(String),
    Fatal(String),
    Timeout,
    Cancel,
    Poll(u64),
}

/// Strategy for generating valid, non-wildcard channel ids
pub fn channel_strategy() -> impl Strategy<Value = i32> {
    prop_oneof![Just(1), 0i32..64, any::<i32>().prop_filter("wildcard", |id| *id != -1)]
}

/// Strategy for generating per-test settings
pub fn test_config_strategy() -> impl Strategy<Value = TestConfig> {
    (channel_strategy(), 0u64..5_000, any::<bool>()).prop_map(
        |(channel, timeout_ms, cancel_on_fail)| TestConfig {
            channel,
            timeout_ms,
            cancel_on_fail,
        },
    )
}

/// Strategy for generating finalizer and polling calls
pub fn case_action_strategy() -> impl Strategy<Value = CaseAction> {
    prop_oneof![
        Just(CaseAction::Complete),
        "[a-z ]{1,24}".prop_map(CaseAction::Fail),
        "[a-z ]{1,24}".prop_map(CaseAction::Fatal),
        Just(CaseAction::Timeout),
        Just(CaseAction::Cancel),
        (0u64..10_000).prop_map(CaseAction::Poll),
    ]
}

/// Strategy for generating the settled (non-pending, non-running) statuses
pub fn settled_status_strategy() -> impl Strategy<Value = TestStatus> {
    prop_oneof![
        Just(TestStatus::Complete),
        Just(TestStatus::Failed),
        Just(TestStatus::Fatal),
        Just(TestStatus::Timeout),
        Just(TestStatus::Canceled),
    ]
}
