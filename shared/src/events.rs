//! Test event schema shared by the harness and deployed units
//!
//! Every record on the event channel is one of the seven kinds below. The
//! enum is closed on purpose: adding a kind is a compile-time-checked change
//! for every consumer, not a string switch with a default branch.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{SharedError, SharedResult};

/// Well-known logical address of the shared test event channel.
///
/// The harness keeps exactly one consumer on this channel for the lifetime
/// of a test class; deployed units hold publish handles to it.
pub const EVENTS_ADDRESS: &str = "__test_events";

/// Result carried by an `assert` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertOutcome {
    Pass,
    Fail,
}

/// One structured record emitted by unit code onto the event channel.
///
/// Wire form is a JSON map with a required `type` field plus kind-specific
/// string fields, e.g. `{"type":"assert","assertResult":"fail",...}`.
/// Records are produced by remote unit code and consumed exactly once by
/// the harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventRecord {
    /// Diagnostic output forwarded to the harness log
    Trace {
        #[serde(rename = "traceMessage")]
        message: String,
    },

    /// Error raised inside unit code, deferred until teardown
    Exception {
        #[serde(rename = "exceptionMessage")]
        message: String,
        #[serde(rename = "exceptionStackTrace")]
        stack_trace: String,
    },

    /// Assertion result; failures are deferred until teardown
    Assert {
        #[serde(rename = "assertResult")]
        result: AssertOutcome,
        #[serde(rename = "assertMessage")]
        message: String,
        #[serde(rename = "assertStackTrace")]
        stack_trace: String,
    },

    /// Announcement that a named test should begin
    StartTest {
        #[serde(rename = "startTestName")]
        name: String,
    },

    /// One unit instance finished starting up
    AppReady,

    /// One unit instance finished stopping
    AppStopped,

    /// The announced test ran to completion
    TestComplete,
}

/// Discriminant of an [`EventRecord`], used for wait matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Trace,
    Exception,
    Assert,
    StartTest,
    AppReady,
    AppStopped,
    TestComplete,
}

impl EventKind {
    /// Lifecycle kinds are the ones the harness explicitly waits for,
    /// in order, one record per instance per transition.
    pub fn is_lifecycle(self) -> bool {
        matches!(
            self,
            EventKind::AppReady | EventKind::AppStopped | EventKind::TestComplete
        )
    }

    /// The kind's wire name, as carried in the record's `type` field.
    pub fn wire_name(self) -> &'static str {
        match self {
            EventKind::Trace => "trace",
            EventKind::Exception => "exception",
            EventKind::Assert => "assert",
            EventKind::StartTest => "startTest",
            EventKind::AppReady => "appReady",
            EventKind::AppStopped => "appStopped",
            EventKind::TestComplete => "testComplete",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl EventRecord {
    pub fn kind(&self) -> EventKind {
        match self {
            EventRecord::Trace { .. } => EventKind::Trace,
            EventRecord::Exception { .. } => EventKind::Exception,
            EventRecord::Assert { .. } => EventKind::Assert,
            EventRecord::StartTest { .. } => EventKind::StartTest,
            EventRecord::AppReady => EventKind::AppReady,
            EventRecord::AppStopped => EventKind::AppStopped,
            EventRecord::TestComplete => EventKind::TestComplete,
        }
    }

    /// Encode into the raw wire map published on the channel.
    pub fn to_raw(&self) -> SharedResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| SharedError::SerializationError {
            message: format!("Failed to encode {} record: {e}", self.kind()),
        })
    }

    /// Decode a raw record delivered by the channel.
    ///
    /// An unrecognized `type`, or a record missing a required field, is a
    /// protocol error; the caller decides whether that is fatal.
    pub fn from_raw(raw: serde_json::Value) -> SharedResult<Self> {
        let kind = raw
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("<missing>")
            .to_string();
        serde_json::from_value(raw).map_err(|e| SharedError::ProtocolError {
            message: format!("Bad event record of type '{kind}': {e}"),
        })
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind().fmt(f)
    }
}
