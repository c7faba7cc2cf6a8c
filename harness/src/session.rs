//! Suite-wide shared context
//!
//! One `TestSession` serves a whole suite: it owns the event channel both
//! sides share and the handle to the deployment platform. Individual runs
//! borrow the session; nothing here is global or static, so two suites in
//! one process stay fully isolated.

use shared::{EventChannel, TestReporter};
use std::sync::Arc;

use crate::error::{HarnessError, HarnessResult};
use crate::traits::UnitDeployer;

#[derive(Clone)]
pub struct TestSession {
    channel: EventChannel,
    deployer: Arc<dyn UnitDeployer>,
}

impl TestSession {
    pub fn new(deployer: Arc<dyn UnitDeployer>) -> Self {
        Self::with_channel(deployer, EventChannel::default())
    }

    pub fn with_channel(deployer: Arc<dyn UnitDeployer>, channel: EventChannel) -> Self {
        Self { channel, deployer }
    }

    pub fn channel(&self) -> &EventChannel {
        &self.channel
    }

    pub fn deployer(&self) -> &Arc<dyn UnitDeployer> {
        &self.deployer
    }

    /// Publisher handle for unit code sharing this session's channel.
    pub fn reporter(&self) -> TestReporter {
        TestReporter::new(self.channel.clone())
    }

    /// End-of-suite check that the platform holds no module references.
    pub async fn shutdown(&self) -> HarnessResult<()> {
        let leaked = self.deployer.check_no_leaked_modules().await;
        if leaked > 0 {
            return Err(HarnessError::ResourceLeak {
                detail: format!("{leaked} module reference(s) remain after suite shutdown"),
            });
        }
        Ok(())
    }
}
