//! Event channel subscription
//!
//! The consumer end of the shared event channel: one spawned task per test
//! run pulls raw records off a broadcast receiver and hands each one to the
//! classifier. The task survives malformed records (the classifier swallows
//! them) and ends when it is removed or every publisher is gone.

use shared::{EventChannel, EVENTS_ADDRESS};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::EventClassifier;

/// Handle to the running subscription task.
pub struct EventSubscription {
    task: JoinHandle<()>,
}

impl EventSubscription {
    /// Subscribe to the channel and start dispatching delivered records.
    ///
    /// Records published before this call are not observed.
    pub fn install(channel: &EventChannel, classifier: EventClassifier) -> Self {
        let mut rx = channel.subscribe();
        debug!("Subscribed to {EVENTS_ADDRESS}");
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(raw) => classifier.dispatch(raw),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Event subscription lagged, {skipped} record(s) lost");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Event channel closed, removing subscription");
                        break;
                    }
                }
            }
        });
        Self { task }
    }

    /// True while the subscription task is still consuming.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop consuming and drop the channel subscription.
    pub fn remove(self) {
        self.task.abort();
    }
}
