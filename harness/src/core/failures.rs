//! Deferred failure collection
//!
//! Assertion failures and exceptions reported by unit code do not abort
//! anything at arrival time. They land here, in arrival order, and the whole
//! batch is raised together at teardown. A failure observed between two
//! lifecycle waits is therefore never lost, and unit code is never torn down
//! mid-flight by a bad check.

use std::fmt;
use std::sync::Mutex;

/// One deferred failure: a failed assertion or an exception from unit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub message: String,
    pub stack_trace: String,
}

impl FailureRecord {
    pub fn new(message: impl Into<String>, stack_trace: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack_trace: stack_trace.into(),
        }
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.message, self.stack_trace)
    }
}

/// Append-only, ordered store of deferred failures for one test run.
///
/// Safe to call from the subscription task and the test task concurrently.
#[derive(Debug, Default)]
pub struct FailureLedger {
    failures: Mutex<Vec<FailureRecord>>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a failure in arrival order.
    pub fn record(&self, failure: FailureRecord) {
        self.failures.lock().unwrap().push(failure);
    }

    /// Take every accumulated failure, leaving the ledger empty.
    pub fn drain(&self) -> Vec<FailureRecord> {
        std::mem::take(&mut *self.failures.lock().unwrap())
    }

    pub fn is_empty(&self) -> bool {
        self.failures.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.lock().unwrap().len()
    }
}
