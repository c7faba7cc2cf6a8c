//! Shared types for the test harness
//!
//! Contains the event record schema, the broadcast channel it travels on,
//! and the publisher-side reporter handed to unit code. Harness-internal
//! machinery (queueing, waiting, teardown) lives in the harness crate.

pub mod bus;
pub mod errors;
pub mod events;
pub mod logging;
pub mod reporter;

pub use errors::*;

// Re-export the wire-level vocabulary
pub use events::{AssertOutcome, EventKind, EventRecord, EVENTS_ADDRESS};

// Channel and publisher handles
pub use bus::{EventChannel, DEFAULT_CAPACITY};
pub use reporter::{StartSignals, TestReporter};
