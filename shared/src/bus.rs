//! Broadcast channel carrying test event records
//!
//! [`EventChannel`] is a thin wrapper around [`tokio::sync::broadcast`].
//! Unit code publishes from many tasks; the harness keeps one subscriber
//! per test class. Records travel as raw JSON maps so that a malformed
//! record is detected by the consumer, which owns the decision of whether
//! to fail or skip, rather than silently dropped at the publisher.

use tokio::sync::broadcast;
use tracing::warn;

use crate::errors::SharedResult;
use crate::events::EventRecord;

/// Default ring capacity, shared across all receivers.
///
/// Lifecycle traffic is light (a handful of records per deploy/undeploy),
/// so a receiver has to stall for a long time before it lags.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Broadcast channel for test event records.
///
/// Cheap to clone; every clone publishes into the same ring. Publishing is
/// non-blocking and fire-and-forget: records sent while no receiver exists
/// are dropped.
#[derive(Clone, Debug)]
pub struct EventChannel {
    tx: broadcast::Sender<serde_json::Value>,
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventChannel {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a raw record to all active receivers. Never blocks.
    pub fn publish_raw(&self, raw: serde_json::Value) {
        if self.tx.send(raw).is_err() {
            warn!("Event record published with no active receiver, dropping");
        }
    }

    /// Encode and publish a typed record.
    pub fn publish(&self, record: &EventRecord) -> SharedResult<()> {
        self.publish_raw(record.to_raw()?);
        Ok(())
    }

    /// Create an independent receiver observing records sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<serde_json::Value> {
        self.tx.subscribe()
    }

    /// Number of active receivers, for diagnostics.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
