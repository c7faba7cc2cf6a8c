//! Diagnostic trail of harness activity
//!
//! The log records every milestone of a run (deploys, classified record
//! kinds, waits) and is dumped in full when a wait times out. It exists for
//! post-mortem readability only and never influences pass/fail.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Mutex;
use tracing::error;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub entry: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.at.format("%H:%M:%S%.3f"), self.entry)
    }
}

/// Timestamped, append-only activity log for one test run.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(LogEntry {
            at: Utc::now(),
            entry: entry.into(),
        });
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Emit the accumulated trail through the error log, oldest first.
    /// Called when a wait times out, so the sequence that led to the hang is
    /// visible next to the failure.
    pub fn dump(&self) {
        let entries = self.snapshot();
        error!("Dumping {} event log entries", entries.len());
        for entry in &entries {
            error!("  {entry}");
        }
    }
}
