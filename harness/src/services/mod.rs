//! Service implementations
//!
//! Live async machinery as opposed to the pure logic in `core`: the task
//! that pumps the event channel into the classifier.

pub mod subscription;

#[cfg(test)]
pub mod tests;

pub use subscription::EventSubscription;
