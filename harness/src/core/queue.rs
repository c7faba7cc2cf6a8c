//! FIFO buffer for lifecycle events
//!
//! AppReady, AppStopped and TestComplete records are produced by the
//! subscription task and consumed by the test task, strictly in arrival
//! order. The buffer is unbounded: producers never block and nothing is
//! dropped, so the only bounded operation is the consumer's timed pop.

use shared::EventRecord;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Unbounded FIFO of lifecycle event records.
///
/// `push` is callable from any task; popping is serialized through an async
/// mutex so there is exactly one consumer at a time.
#[derive(Debug)]
pub struct LifecycleEventQueue {
    tx: mpsc::UnboundedSender<EventRecord>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<EventRecord>>,
}

impl Default for LifecycleEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleEventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: tokio::sync::Mutex::new(rx),
        }
    }

    /// Append a record. Never blocks, never drops.
    pub fn push(&self, record: EventRecord) {
        // The receiver lives in the same struct, so the channel cannot close
        // while `self` is alive.
        let _ = self.tx.send(record);
    }

    /// Remove and return the head record, waiting up to `limit` for one to
    /// arrive. `None` means the deadline expired with the queue still empty.
    pub async fn pop_within(&self, limit: Duration) -> Option<EventRecord> {
        let mut rx = self.rx.lock().await;
        timeout(limit, rx.recv()).await.ok().flatten()
    }

    /// Discard every buffered record.
    pub async fn clear(&self) {
        let mut rx = self.rx.lock().await;
        while rx.try_recv().is_ok() {}
    }
}
