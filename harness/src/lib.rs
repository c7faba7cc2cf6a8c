//! Synchronization harness for asynchronously-scheduled unit tests
//!
//! Test code runs against units that start, stop and assert on their own
//! schedule, possibly in other processes. This library makes that look
//! synchronous: units publish structured records onto a shared channel, the
//! harness classifies them, buffers lifecycle events for ordered
//! consumption, defers failures until teardown and lets the test block until
//! an expected event arrives or a deadline expires.

pub mod core;
pub mod error;
pub mod run;
pub mod services;
pub mod session;
pub mod traits;

// Re-export commonly used types
pub use core::{EventLog, FailureRecord};
pub use error::{HarnessError, HarnessResult};
pub use run::{DeployOptions, TestRun, ACK_TIMEOUT};
pub use session::TestSession;
pub use traits::{DeploymentId, UnitDeployer};
