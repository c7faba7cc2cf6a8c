//! Harness-specific error types

use shared::{EventKind, SharedError};
use std::time::Duration;
use thiserror::Error;

use crate::core::failures::FailureRecord;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Timed out after {timeout:?} waiting for {waiting_for} event")]
    Timeout {
        waiting_for: EventKind,
        timeout: Duration,
    },

    #[error("Expected event: {expected} got: {actual}")]
    UnexpectedEvent {
        expected: EventKind,
        actual: EventKind,
    },

    #[error("{} failure(s) reported from unit code:\n{}", .failures.len(), render_failures(.failures))]
    FailedAssertions { failures: Vec<FailureRecord> },

    #[error("Resource leak after teardown: {detail}")]
    ResourceLeak { detail: String },

    #[error("Deployment failed: {message}")]
    Deploy { message: String },

    #[error("Shared component error")]
    SharedError(#[from] SharedError),
}

fn render_failures(failures: &[FailureRecord]) -> String {
    failures
        .iter()
        .map(FailureRecord::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub type HarnessResult<T> = Result<T, HarnessError>;
