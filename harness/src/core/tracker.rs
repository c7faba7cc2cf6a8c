//! Registry of deployments owned by the current test run
//!
//! Every successful deploy is recorded here and every successful stop
//! removes it again, so teardown can stop whatever the test body left
//! behind. The set must end every run empty.

use crate::traits::DeploymentId;
use std::sync::Mutex;

/// Tracks live deployment ids in deploy order.
#[derive(Debug, Default)]
pub struct DeploymentTracker {
    deployed: Mutex<Vec<DeploymentId>>,
}

impl DeploymentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deployment the run is now responsible for stopping.
    pub fn record(&self, id: DeploymentId) {
        self.deployed.lock().unwrap().push(id);
    }

    /// Forget a deployment that was stopped cleanly.
    pub fn forget(&self, id: &DeploymentId) {
        self.deployed.lock().unwrap().retain(|known| known != id);
    }

    /// Ids still live, in deploy order.
    pub fn snapshot(&self) -> Vec<DeploymentId> {
        self.deployed.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.deployed.lock().unwrap().is_empty()
    }
}
