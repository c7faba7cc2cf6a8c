//! Publisher-side helper for unit code under test
//!
//! A [`TestReporter`] is handed to deployed unit code and turns outcomes
//! into records on the shared event channel. Assertion failures are not
//! panics here: they become `assert` records that the harness collects and
//! raises together at teardown, so one bad check never tears down the
//! process that produced it.

use std::backtrace::Backtrace;
use std::fmt;

use tokio::sync::broadcast;

use crate::bus::EventChannel;
use crate::errors::SharedResult;
use crate::events::{AssertOutcome, EventRecord};

/// Emits test event records from inside unit code.
#[derive(Clone, Debug)]
pub struct TestReporter {
    channel: EventChannel,
}

impl TestReporter {
    pub fn new(channel: EventChannel) -> Self {
        Self { channel }
    }

    /// Record an assertion outcome. A failed condition publishes a `fail`
    /// record with the capture site; it does not panic or return early.
    pub fn check(&self, condition: bool, message: &str) -> SharedResult<()> {
        let (result, stack_trace) = if condition {
            (AssertOutcome::Pass, String::new())
        } else {
            (AssertOutcome::Fail, Backtrace::force_capture().to_string())
        };
        self.channel.publish(&EventRecord::Assert {
            result,
            message: message.to_string(),
            stack_trace,
        })
    }

    /// Record equality of two displayable values.
    pub fn check_eq<T: PartialEq + std::fmt::Debug>(
        &self,
        expected: T,
        actual: T,
        message: &str,
    ) -> SharedResult<()> {
        if expected == actual {
            self.check(true, message)
        } else {
            self.check(
                false,
                &format!("{message} (expected {expected:?}, got {actual:?})"),
            )
        }
    }

    /// Record an unconditional failure.
    pub fn fail(&self, message: &str) -> SharedResult<()> {
        self.check(false, message)
    }

    /// Report an error raised inside unit code. Collected and re-raised by
    /// the harness at teardown alongside failed assertions.
    pub fn exception<E: fmt::Display>(&self, error: &E) -> SharedResult<()> {
        self.channel.publish(&EventRecord::Exception {
            message: error.to_string(),
            stack_trace: Backtrace::force_capture().to_string(),
        })
    }

    /// Forward diagnostic output to the harness log.
    pub fn trace(&self, message: &str) -> SharedResult<()> {
        self.channel.publish(&EventRecord::Trace {
            message: message.to_string(),
        })
    }

    /// Announce that the named test should begin in the deployed unit.
    pub fn start_test(&self, name: &str) -> SharedResult<()> {
        self.channel.publish(&EventRecord::StartTest {
            name: name.to_string(),
        })
    }

    /// Signal that one unit instance finished starting.
    pub fn app_ready(&self) -> SharedResult<()> {
        self.channel.publish(&EventRecord::AppReady)
    }

    /// Signal that one unit instance finished stopping.
    pub fn app_stopped(&self) -> SharedResult<()> {
        self.channel.publish(&EventRecord::AppStopped)
    }

    /// Signal that the announced test ran to completion.
    pub fn test_complete(&self) -> SharedResult<()> {
        self.channel.publish(&EventRecord::TestComplete)
    }

    /// Listen for test announcements addressed to this unit.
    ///
    /// Yields the name carried by each subsequent `startTest` record;
    /// everything else on the channel is skipped.
    pub fn start_signals(&self) -> StartSignals {
        StartSignals {
            rx: self.channel.subscribe(),
        }
    }
}

/// Filtered view of the event channel carrying only test announcements.
pub struct StartSignals {
    rx: broadcast::Receiver<serde_json::Value>,
}

impl StartSignals {
    /// Next announced test name, or `None` once every publisher is gone.
    pub async fn next(&mut self) -> Option<String> {
        loop {
            match self.rx.recv().await {
                Ok(raw) => {
                    if let Ok(EventRecord::StartTest { name }) = EventRecord::from_raw(raw) {
                        return Some(name);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
