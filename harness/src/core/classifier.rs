//! Routing of incoming event records
//!
//! One classifier instance serves one test run. Every record delivered by
//! the subscription is dispatched exactly once: traces go to the log,
//! failures to the ledger, lifecycle events into the FIFO. A record that
//! cannot be decoded is reported and skipped; the subscription must keep
//! consuming no matter what arrives.

use shared::{AssertOutcome, EventRecord};
use std::sync::Arc;
use tracing::{error, trace};

use crate::core::event_log::EventLog;
use crate::core::failures::{FailureLedger, FailureRecord};
use crate::core::queue::LifecycleEventQueue;

pub struct EventClassifier {
    queue: Arc<LifecycleEventQueue>,
    ledger: Arc<FailureLedger>,
    event_log: Arc<EventLog>,
}

impl EventClassifier {
    pub fn new(
        queue: Arc<LifecycleEventQueue>,
        ledger: Arc<FailureLedger>,
        event_log: Arc<EventLog>,
    ) -> Self {
        Self {
            queue,
            ledger,
            event_log,
        }
    }

    /// Classify one raw record from the channel.
    ///
    /// Never fails: a malformed record is logged and dropped so one bad
    /// publisher cannot wedge the run.
    pub fn dispatch(&self, raw: serde_json::Value) {
        let record = match EventRecord::from_raw(raw) {
            Ok(record) => record,
            Err(err) => {
                error!("Failed to classify event record: {err}");
                self.event_log.add(format!("Unclassifiable record: {err}"));
                return;
            }
        };

        self.event_log.add(format!("Received {} event", record.kind()));

        match record {
            EventRecord::Trace { message } => {
                trace!("{message}");
            }
            EventRecord::Exception {
                message,
                stack_trace,
            } => {
                self.ledger.record(FailureRecord::new(message, stack_trace));
            }
            EventRecord::Assert {
                result: AssertOutcome::Pass,
                ..
            } => {}
            EventRecord::Assert {
                result: AssertOutcome::Fail,
                message,
                stack_trace,
            } => {
                self.ledger.record(FailureRecord::new(message, stack_trace));
            }
            // The harness hears its own announcement on the shared channel
            EventRecord::StartTest { .. } => {}
            lifecycle @ (EventRecord::AppReady
            | EventRecord::AppStopped
            | EventRecord::TestComplete) => {
                self.queue.push(lifecycle);
            }
        }
    }
}
