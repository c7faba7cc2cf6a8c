//! Per-test run coordination
//!
//! A `TestRun` owns everything that must reset between tests: the lifecycle
//! FIFO, the failure ledger, the deployment registry, the diagnostic trail
//! and the channel subscription. The cycle is `setup()`, test body,
//! `teardown()`; every method takes `&self` so a looping driver can re-enter
//! the same run.

use shared::EventKind;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::core::{
    default_timeout, DeploymentTracker, EventClassifier, EventLog, FailureLedger,
    LifecycleEventQueue, WaitCoordinator, FAST_WAIT,
};
use crate::error::{HarnessError, HarnessResult};
use crate::services::EventSubscription;
use crate::session::TestSession;
use crate::traits::DeploymentId;

/// Bound on deployment platform acknowledgements (deploy and undeploy).
pub const ACK_TIMEOUT: Duration = Duration::from_secs(30);

/// How to deploy a unit or module.
///
/// Defaults match the common case: one instance, no config, block until the
/// instance reports ready.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub config: Option<serde_json::Value>,
    pub instances: u32,
    pub worker: bool,
    pub await_ready: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            config: None,
            instances: 1,
            worker: false,
            await_ready: true,
        }
    }
}

impl DeployOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_instances(mut self, instances: u32) -> Self {
        self.instances = instances;
        self
    }

    /// Deploy on the platform's blocking-work scheduler.
    pub fn as_worker(mut self) -> Self {
        self.worker = true;
        self
    }

    /// Return as soon as the deploy is acknowledged, without awaiting the
    /// per-instance ready events.
    pub fn no_wait(mut self) -> Self {
        self.await_ready = false;
        self
    }
}

/// State and operations for one test, reusable across loop iterations.
pub struct TestRun {
    session: TestSession,
    queue: Arc<LifecycleEventQueue>,
    ledger: Arc<FailureLedger>,
    event_log: Arc<EventLog>,
    tracker: DeploymentTracker,
    waiter: WaitCoordinator,
    subscription: Mutex<Option<EventSubscription>>,
}

impl TestRun {
    /// Bind a run to a session. Nothing is consumed from the channel until
    /// [`setup`](TestRun::setup) installs the subscription.
    pub fn new(session: &TestSession) -> Self {
        let queue = Arc::new(LifecycleEventQueue::new());
        let ledger = Arc::new(FailureLedger::new());
        let event_log = Arc::new(EventLog::new());
        let waiter = WaitCoordinator::new(Arc::clone(&queue), Arc::clone(&event_log));
        Self {
            session: session.clone(),
            queue,
            ledger,
            event_log,
            tracker: DeploymentTracker::new(),
            waiter,
            subscription: Mutex::new(None),
        }
    }

    /// Prepare for a test body: clear the diagnostic trail, reset the
    /// lifecycle buffer and failure ledger, install the channel
    /// subscription.
    pub async fn setup(&self) -> HarnessResult<()> {
        self.event_log.clear();
        self.queue.clear().await;
        self.ledger.drain();

        let classifier = EventClassifier::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.ledger),
            Arc::clone(&self.event_log),
        );
        let subscription = EventSubscription::install(self.session.channel(), classifier);
        if let Some(previous) = self.subscription.lock().unwrap().replace(subscription) {
            warn!("Replacing an event subscription that was never removed");
            previous.remove();
        }
        Ok(())
    }

    /// Deploy one instance of a unit and wait for it to report ready.
    pub async fn start_app(&self, unit_ref: &str) -> HarnessResult<DeploymentId> {
        self.start_app_with(unit_ref, DeployOptions::default())
            .await
    }

    /// Deploy a unit with explicit options.
    ///
    /// Resolves once the platform acknowledges the deploy (bounded by
    /// [`ACK_TIMEOUT`]) and, unless `no_wait`, one `appReady` has arrived
    /// per instance. The deployment is tracked for teardown as soon as the
    /// acknowledgement lands, so a failed ready-wait still gets cleaned up.
    pub async fn start_app_with(
        &self,
        unit_ref: &str,
        options: DeployOptions,
    ) -> HarnessResult<DeploymentId> {
        let DeployOptions {
            config,
            instances,
            worker,
            await_ready,
        } = options;

        self.event_log.add(format!("Starting app {unit_ref}"));
        let deployer = self.session.deployer();
        let acked = if worker {
            timeout(ACK_TIMEOUT, deployer.deploy_worker(unit_ref, config, instances)).await
        } else {
            timeout(ACK_TIMEOUT, deployer.deploy(unit_ref, config, instances)).await
        };
        let id = match acked {
            Err(_) => {
                return Err(HarnessError::Deploy {
                    message: format!("Timed out waiting for {unit_ref} to start"),
                })
            }
            Ok(result) => result?,
        };

        self.track_deployed(id, instances, await_ready).await
    }

    /// Deploy one instance of a named module and wait for it to report
    /// ready.
    pub async fn start_module(&self, module_name: &str) -> HarnessResult<DeploymentId> {
        self.start_module_with(module_name, DeployOptions::default())
            .await
    }

    /// Deploy a named module with explicit options. The `worker` flag has no
    /// effect here; how module instances are scheduled is the platform's
    /// choice.
    pub async fn start_module_with(
        &self,
        module_name: &str,
        options: DeployOptions,
    ) -> HarnessResult<DeploymentId> {
        let DeployOptions {
            config,
            instances,
            await_ready,
            ..
        } = options;

        self.event_log.add(format!("Starting module {module_name}"));
        let deployer = self.session.deployer();
        let acked = timeout(
            ACK_TIMEOUT,
            deployer.deploy_module(module_name, config, instances),
        )
        .await;
        let id = match acked {
            Err(_) => {
                return Err(HarnessError::Deploy {
                    message: format!("Timed out waiting for {module_name} to start"),
                })
            }
            Ok(result) => result?,
        };

        self.track_deployed(id, instances, await_ready).await
    }

    async fn track_deployed(
        &self,
        id: DeploymentId,
        instances: u32,
        await_ready: bool,
    ) -> HarnessResult<DeploymentId> {
        self.tracker.record(id.clone());
        self.event_log.add(format!("App {id} deployed"));
        if await_ready {
            for _ in 0..instances {
                self.wait_app_ready().await?;
                self.event_log.add("App is ready");
            }
        }
        Ok(id)
    }

    /// Undeploy everything behind `id` and wait for each instance to report
    /// stopped.
    pub async fn stop_app(&self, id: &DeploymentId) -> HarnessResult<()> {
        self.event_log.add(format!("Stopping app {id}"));
        let deployer = self.session.deployer();
        let instances = deployer
            .list_instance_counts()
            .await
            .get(id)
            .copied()
            .ok_or_else(|| HarnessError::Deploy {
                message: format!("Unknown deployment: {id}"),
            })?;

        match timeout(ACK_TIMEOUT, deployer.undeploy(id)).await {
            Err(_) => {
                return Err(HarnessError::Deploy {
                    message: format!("Timed out waiting for {id} to stop"),
                })
            }
            Ok(result) => result?,
        }
        self.event_log.add(format!("App {id} undeployed"));

        for _ in 0..instances {
            self.wait_app_stopped().await?;
        }
        self.event_log.add("Waited for app to stop");
        self.tracker.forget(id);
        Ok(())
    }

    /// Announce the named test and block until it reports completion.
    pub async fn start_test(&self, name: &str) -> HarnessResult<()> {
        self.announce_test(name)?;
        self.event_log.add("Waiting for test to complete");
        self.wait_test_complete().await?;
        self.event_log.add("Test is now complete");
        Ok(())
    }

    /// Announce the named test without waiting for completion.
    pub fn announce_test(&self, name: &str) -> HarnessResult<()> {
        info!("Starting test: {name}");
        self.event_log.add(format!("Starting test {name}"));
        self.session.reporter().start_test(name)?;
        Ok(())
    }

    pub async fn wait_app_ready(&self) -> HarnessResult<()> {
        self.wait_app_ready_within(default_timeout()).await
    }

    pub async fn wait_app_ready_within(&self, limit: Duration) -> HarnessResult<()> {
        self.waiter.wait_for(EventKind::AppReady, limit).await
    }

    pub async fn wait_app_stopped(&self) -> HarnessResult<()> {
        self.wait_app_stopped_within(default_timeout()).await
    }

    pub async fn wait_app_stopped_within(&self, limit: Duration) -> HarnessResult<()> {
        self.waiter.wait_for(EventKind::AppStopped, limit).await
    }

    pub async fn wait_test_complete(&self) -> HarnessResult<()> {
        self.wait_test_complete_within(default_timeout()).await
    }

    pub async fn wait_test_complete_within(&self, limit: Duration) -> HarnessResult<()> {
        self.waiter.wait_for(EventKind::TestComplete, limit).await
    }

    /// Wait briefly for an expected event kind (5 second bound).
    pub async fn wait_event(&self, kind: EventKind) -> HarnessResult<()> {
        self.wait_event_within(kind, FAST_WAIT).await
    }

    pub async fn wait_event_within(&self, kind: EventKind, limit: Duration) -> HarnessResult<()> {
        self.waiter.wait_for(kind, limit).await
    }

    /// Finish a test: raise deferred failures, stop leftover deployments,
    /// drain buffers, remove the subscription, verify nothing leaked.
    ///
    /// Every step runs even when an earlier one fails. When several fail,
    /// the cleanup error wins over the deferred-failure report, which wins
    /// over the leak check; the losers are still logged in full.
    pub async fn teardown(&self) -> HarnessResult<()> {
        let failures = self.ledger.drain();
        let failure_err = if failures.is_empty() {
            None
        } else {
            for failure in &failures {
                error!("Deferred failure:\n{failure}");
            }
            Some(HarnessError::FailedAssertions { failures })
        };

        let mut cleanup_err = None;
        for id in self.tracker.snapshot() {
            if let Err(err) = self.stop_app(&id).await {
                error!("Failed to stop {id} during teardown: {err}");
                cleanup_err.get_or_insert(err);
            }
        }

        self.queue.clear().await;

        if let Some(subscription) = self.subscription.lock().unwrap().take() {
            subscription.remove();
        }

        let leak_err = self.verify_no_leaks().await.err();

        match cleanup_err.or(failure_err).or(leak_err) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn verify_no_leaks(&self) -> HarnessResult<()> {
        let remaining = self.tracker.snapshot();
        if !remaining.is_empty() {
            let ids: Vec<String> = remaining.iter().map(ToString::to_string).collect();
            return Err(HarnessError::ResourceLeak {
                detail: format!("deployments still tracked after teardown: {}", ids.join(", ")),
            });
        }
        let leaked = self.session.deployer().check_no_leaked_modules().await;
        if leaked > 0 {
            return Err(HarnessError::ResourceLeak {
                detail: format!("{leaked} module reference(s) remain after test"),
            });
        }
        Ok(())
    }

    /// Run `body` repeatedly, with a full teardown after every iteration and
    /// a fresh setup before the next (not after the last), so each iteration
    /// is hermetic.
    ///
    /// Returns one outcome per iteration; a failed iteration does not stop
    /// the loop. A body error takes precedence over that iteration's
    /// teardown error. If a mid-loop setup fails, its error is appended and
    /// the loop ends early.
    pub async fn run_in_loop<F, Fut>(
        &self,
        test_name: &str,
        iterations: u32,
        body: F,
    ) -> Vec<HarnessResult<()>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = HarnessResult<()>>,
    {
        let mut outcomes = Vec::with_capacity(iterations as usize);
        for iteration in 0..iterations {
            info!("****************************** ITER {iteration} of {test_name}");
            let body_res = body().await;
            let teardown_res = self.teardown().await;
            outcomes.push(body_res.and(teardown_res));

            if iteration + 1 < iterations {
                if let Err(err) = self.setup().await {
                    outcomes.push(Err(err));
                    break;
                }
            }
        }
        outcomes
    }
}
