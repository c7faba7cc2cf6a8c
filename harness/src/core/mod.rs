//! Core synchronization logic
//!
//! Pure event-routing and buffering machinery with no deployment I/O:
//! classification, the lifecycle FIFO, deferred failures, bounded waits and
//! the diagnostic trail. Everything here is driven either by the
//! subscription task or by the test task.

pub mod classifier;
pub mod event_log;
pub mod failures;
pub mod queue;
pub mod tracker;
pub mod waiter;

pub use classifier::EventClassifier;
pub use event_log::EventLog;
pub use failures::{FailureLedger, FailureRecord};
pub use queue::LifecycleEventQueue;
pub use tracker::DeploymentTracker;
pub use waiter::{default_timeout, WaitCoordinator, FAST_WAIT};
