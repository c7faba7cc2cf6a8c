//! Bounded waiting for expected lifecycle events
//!
//! The consumer side of the lifecycle FIFO. A wait names the kind it
//! expects; whatever sits at the head of the queue must be that kind.
//! Receiving nothing within the deadline and receiving the wrong kind are
//! different failures. There is no resynchronization: a mismatch means the
//! test's ordering assumption is already broken, and skipping ahead would
//! only hide it.

use shared::EventKind;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::core::event_log::EventLog;
use crate::core::queue::LifecycleEventQueue;
use crate::error::{HarnessError, HarnessResult};

/// Default bound for the bare `wait_event` form.
pub const FAST_WAIT: Duration = Duration::from_secs(5);

/// Environment variable overriding the default wait bound, in whole seconds.
pub const TIMEOUT_ENV_VAR: &str = "HARNESS_TEST_TIMEOUT";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default bound for lifecycle waits. Read from [`TIMEOUT_ENV_VAR`] once per
/// process; unparsable values fall back to 30 seconds.
pub fn default_timeout() -> Duration {
    static TIMEOUT: OnceLock<Duration> = OnceLock::new();
    *TIMEOUT.get_or_init(|| timeout_from(std::env::var(TIMEOUT_ENV_VAR).ok().as_deref()))
}

fn timeout_from(raw: Option<&str>) -> Duration {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Blocks the test task until the expected event arrives or the deadline
/// expires.
pub struct WaitCoordinator {
    queue: Arc<LifecycleEventQueue>,
    event_log: Arc<EventLog>,
}

impl WaitCoordinator {
    pub fn new(queue: Arc<LifecycleEventQueue>, event_log: Arc<EventLog>) -> Self {
        Self { queue, event_log }
    }

    /// Pop the head of the queue, waiting up to `limit`.
    ///
    /// A deadline expiry dumps the diagnostic trail before returning
    /// `Timeout`, so the sequence that led to the hang is in the log. A
    /// head record of the wrong kind fails immediately with
    /// `UnexpectedEvent`; the record is consumed either way.
    pub async fn wait_for(&self, expected: EventKind, limit: Duration) -> HarnessResult<()> {
        match self.queue.pop_within(limit).await {
            None => {
                self.event_log.dump();
                Err(HarnessError::Timeout {
                    waiting_for: expected,
                    timeout: limit,
                })
            }
            Some(record) if record.kind() == expected => Ok(()),
            Some(record) => Err(HarnessError::UnexpectedEvent {
                expected,
                actual: record.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::EventRecord;

    fn coordinator() -> (WaitCoordinator, Arc<LifecycleEventQueue>) {
        let queue = Arc::new(LifecycleEventQueue::new());
        let event_log = Arc::new(EventLog::new());
        (
            WaitCoordinator::new(Arc::clone(&queue), event_log),
            queue,
        )
    }

    #[tokio::test]
    async fn test_matching_head_succeeds() {
        let (waiter, queue) = coordinator();
        queue.push(EventRecord::AppReady);

        let res = waiter
            .wait_for(EventKind::AppReady, Duration::from_secs(1))
            .await;

        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn test_empty_queue_times_out_with_context() {
        let (waiter, _queue) = coordinator();

        let err = waiter
            .wait_for(EventKind::TestComplete, Duration::from_millis(50))
            .await
            .unwrap_err();

        match err {
            HarnessError::Timeout {
                waiting_for,
                timeout,
            } => {
                assert_eq!(waiting_for, EventKind::TestComplete);
                assert_eq!(timeout, Duration::from_millis(50));
            }
            other => panic!("expected timeout, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_kind_at_head_fails_immediately() {
        let (waiter, queue) = coordinator();
        queue.push(EventRecord::AppStopped);

        let err = waiter
            .wait_for(EventKind::AppReady, Duration::from_secs(1))
            .await
            .unwrap_err();

        match err {
            HarnessError::UnexpectedEvent { expected, actual } => {
                assert_eq!(expected, EventKind::AppReady);
                assert_eq!(actual, EventKind::AppStopped);
            }
            other => panic!("expected unexpected-event, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_mismatch_consumes_the_head() {
        let (waiter, queue) = coordinator();
        queue.push(EventRecord::AppStopped);
        queue.push(EventRecord::AppReady);

        // The mismatched AppStopped is consumed by the failed wait
        let _ = waiter
            .wait_for(EventKind::AppReady, Duration::from_secs(1))
            .await;

        let res = waiter
            .wait_for(EventKind::AppReady, Duration::from_secs(1))
            .await;
        assert!(res.is_ok());
    }

    /// The wait parks on the queue rather than polling it: pending until a
    /// push arrives, woken by the push itself.
    #[tokio::test]
    async fn test_wait_is_woken_by_a_push() {
        let (waiter, queue) = coordinator();

        let mut wait = tokio_test::task::spawn(
            waiter.wait_for(EventKind::AppReady, Duration::from_secs(5)),
        );
        tokio_test::assert_pending!(wait.poll());

        queue.push(EventRecord::AppReady);
        assert!(wait.is_woken());
        assert!(tokio_test::assert_ready!(wait.poll()).is_ok());
    }

    #[test]
    fn test_timeout_parsing_falls_back_to_default() {
        assert_eq!(timeout_from(None), Duration::from_secs(30));
        assert_eq!(timeout_from(Some("garbage")), Duration::from_secs(30));
        assert_eq!(timeout_from(Some("")), Duration::from_secs(30));
    }

    #[test]
    fn test_timeout_parsing_accepts_whole_seconds() {
        assert_eq!(timeout_from(Some("90")), Duration::from_secs(90));
        assert_eq!(timeout_from(Some(" 5 ")), Duration::from_secs(5));
    }
}
