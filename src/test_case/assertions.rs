use super::{CaseHandle, TestCase};
use std::fmt::Debug;

/// Assertion helpers available inside test bodies.
///
/// Each helper logs its outcome and returns it so the body can branch. A
/// failing helper calls the guarded `fail`, so after the first failure later
/// helpers still evaluate and log but leave the status untouched.
pub trait Assertions {
    fn assertion_target(&self) -> &CaseHandle;

    fn is_true(&self, condition: bool) -> bool {
        let text = if condition {
            format!("IsTrue passed    - [bool condition] {condition}")
        } else {
            format!("IsTrue failed    - [bool condition] {condition}")
        };
        self.assertion_target().record_assertion(condition, text)
    }

    fn is_false(&self, condition: bool) -> bool {
        let text = if condition {
            format!("IsFalse failed   - [bool condition] {condition}")
        } else {
            format!("IsFalse passed   - [bool condition] {condition}")
        };
        self.assertion_target().record_assertion(!condition, text)
    }

    fn is_null<T: Debug>(&self, value: &Option<T>) -> bool {
        let passed = value.is_none();
        let text = if passed {
            "IsNull passed    - [value] None".to_string()
        } else {
            format!("IsNull failed    - [value] {value:?}")
        };
        self.assertion_target().record_assertion(passed, text)
    }

    fn is_not_null<T: Debug>(&self, value: &Option<T>) -> bool {
        let passed = value.is_some();
        let text = if passed {
            format!("IsNotNull passed - [value] {value:?}")
        } else {
            "IsNotNull failed - [value] None".to_string()
        };
        self.assertion_target().record_assertion(passed, text)
    }

    fn is_equal<T: PartialEq + Debug>(&self, expected: &T, actual: &T) -> bool {
        let passed = expected == actual;
        let text = if passed {
            format!("IsEqual passed   - [expected] {expected:?}")
        } else {
            format!("IsEqual failed   - [expected] {expected:?} [actual] {actual:?}")
        };
        self.assertion_target().record_assertion(passed, text)
    }
}

impl Assertions for TestCase {
    fn assertion_target(&self) -> &CaseHandle {
        self.handle()
    }
}

impl Assertions for CaseHandle {
    fn assertion_target(&self) -> &CaseHandle {
        self
    }
}
