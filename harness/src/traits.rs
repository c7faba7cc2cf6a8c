//! Trait definitions with mockall annotations for testing
//!
//! The deployment collaborator is the harness's one external seam: how unit
//! code is located, packaged and scheduled is someone else's problem. Tests
//! inject a mock; real integrations implement the trait over whatever
//! platform actually runs the units.

use crate::error::HarnessResult;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of one deployment (possibly many instances).
///
/// Compared and displayed as a plain string; implementations that need to
/// mint ids use [`DeploymentId::fresh`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeploymentId(String);

impl DeploymentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a unique id for a new deployment.
    pub fn fresh() -> Self {
        Self(format!("deployment-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deployment platform abstraction for dependency injection
///
/// Starts and stops unit deployments on behalf of the harness. Methods
/// resolve when the platform has acknowledged the operation, not when the
/// deployed code has signalled readiness; readiness travels as `appReady`
/// records on the event channel and is awaited separately. The harness
/// bounds every acknowledgement wait itself.
#[mockall::automock]
#[async_trait::async_trait]
pub trait UnitDeployer: Send + Sync {
    /// Deploy `instances` copies of a unit.
    ///
    /// # Parameters
    /// - `unit_ref`: platform-specific reference to the unit's code
    /// - `config`: optional configuration passed through to the instances
    /// - `instances`: number of copies to schedule
    ///
    /// # Returns
    /// The id under which all instances were deployed
    async fn deploy(
        &self,
        unit_ref: &str,
        config: Option<serde_json::Value>,
        instances: u32,
    ) -> HarnessResult<DeploymentId>;

    /// Deploy a unit on the platform's blocking-work scheduler.
    ///
    /// Same contract as [`deploy`](UnitDeployer::deploy); the instances may
    /// block without starving event-loop units.
    async fn deploy_worker(
        &self,
        unit_ref: &str,
        config: Option<serde_json::Value>,
        instances: u32,
    ) -> HarnessResult<DeploymentId>;

    /// Deploy a named, pre-packaged module.
    ///
    /// # Parameters
    /// - `module_name`: the module's registered name
    /// - `config`: optional configuration passed through to the instances
    /// - `instances`: number of copies to schedule
    async fn deploy_module(
        &self,
        module_name: &str,
        config: Option<serde_json::Value>,
        instances: u32,
    ) -> HarnessResult<DeploymentId>;

    /// Undeploy everything behind `id`.
    ///
    /// Resolves when the platform has acknowledged the undeploy; the
    /// per-instance `appStopped` records are awaited by the caller.
    async fn undeploy(&self, id: &DeploymentId) -> HarnessResult<()>;

    /// Instance counts of every live deployment, keyed by id.
    async fn list_instance_counts(&self) -> HashMap<DeploymentId, u32>;

    /// Number of module references still held by the platform.
    ///
    /// Non-zero after a full teardown means something leaked.
    async fn check_no_leaked_modules(&self) -> usize;
}
