//! Test fixtures and data for harness tests
//!
//! The central fixture is [`StubDeployer`]: a deployment platform stand-in
//! that publishes the readiness and stop records real units would, over the
//! same shared channel, with switches for the failure modes the harness has
//! to survive.

#![allow(dead_code)] // Each test binary uses a subset of these utilities

use async_trait::async_trait;
use harness::{DeploymentId, HarnessError, HarnessResult, UnitDeployer};
use shared::TestReporter;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Unit references used across the suites.
pub struct TestFixtures;

impl TestFixtures {
    pub const ECHO_UNIT: &'static str = "units.echo";
    pub const SILENT_UNIT: &'static str = "units.silent";
    pub const BROKEN_UNIT: &'static str = "units.broken";
    pub const STALLED_UNIT: &'static str = "units.stalled";
    pub const MAILER_MODULE: &'static str = "acme.mailer-v1.0";

    pub const PING_TEST: &'static str = "test_ping";
    pub const FLAKY_TEST: &'static str = "test_flaky";
}

/// Scripted deployment platform.
///
/// Deploys mint a fresh id and publish one `appReady` per instance;
/// undeploys publish one `appStopped` per instance. Behavior switches make
/// specific unit refs misbehave without touching the happy path.
pub struct StubDeployer {
    reporter: TestReporter,
    live: Mutex<HashMap<DeploymentId, u32>>,
    silent_refs: Mutex<HashSet<String>>,
    refused_refs: Mutex<HashSet<String>>,
    stalled_refs: Mutex<HashSet<String>>,
    fail_undeploys: AtomicBool,
    leaked_modules: AtomicUsize,
    undeploy_attempts: AtomicUsize,
    worker_deploys: AtomicUsize,
    module_deploys: AtomicUsize,
    last_config: Mutex<Option<serde_json::Value>>,
}

impl StubDeployer {
    pub fn new(reporter: TestReporter) -> Self {
        Self {
            reporter,
            live: Mutex::new(HashMap::new()),
            silent_refs: Mutex::new(HashSet::new()),
            refused_refs: Mutex::new(HashSet::new()),
            stalled_refs: Mutex::new(HashSet::new()),
            fail_undeploys: AtomicBool::new(false),
            leaked_modules: AtomicUsize::new(0),
            undeploy_attempts: AtomicUsize::new(0),
            worker_deploys: AtomicUsize::new(0),
            module_deploys: AtomicUsize::new(0),
            last_config: Mutex::new(None),
        }
    }

    /// Instances of this ref deploy but never report ready.
    pub fn make_silent(&self, unit_ref: &str) {
        self.silent_refs.lock().unwrap().insert(unit_ref.to_string());
    }

    /// Deploys of this ref fail outright.
    pub fn refuse(&self, unit_ref: &str) {
        self.refused_refs
            .lock()
            .unwrap()
            .insert(unit_ref.to_string());
    }

    /// Deploys of this ref never acknowledge.
    pub fn stall(&self, unit_ref: &str) {
        self.stalled_refs
            .lock()
            .unwrap()
            .insert(unit_ref.to_string());
    }

    /// Every undeploy from now on fails before stopping anything.
    pub fn fail_undeploys(&self) {
        self.fail_undeploys.store(true, Ordering::SeqCst);
    }

    /// Undo [`fail_undeploys`](StubDeployer::fail_undeploys).
    pub fn allow_undeploys(&self) {
        self.fail_undeploys.store(false, Ordering::SeqCst);
    }

    pub fn set_leaked_modules(&self, count: usize) {
        self.leaked_modules.store(count, Ordering::SeqCst);
    }

    pub fn undeploy_attempts(&self) -> usize {
        self.undeploy_attempts.load(Ordering::SeqCst)
    }

    pub fn worker_deploys(&self) -> usize {
        self.worker_deploys.load(Ordering::SeqCst)
    }

    pub fn module_deploys(&self) -> usize {
        self.module_deploys.load(Ordering::SeqCst)
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    pub fn last_config(&self) -> Option<serde_json::Value> {
        self.last_config.lock().unwrap().clone()
    }

    async fn admit(
        &self,
        unit_ref: &str,
        config: Option<serde_json::Value>,
        instances: u32,
    ) -> HarnessResult<DeploymentId> {
        if self.stalled_refs.lock().unwrap().contains(unit_ref) {
            std::future::pending::<()>().await;
        }
        if self.refused_refs.lock().unwrap().contains(unit_ref) {
            return Err(HarnessError::Deploy {
                message: format!("No such unit: {unit_ref}"),
            });
        }

        *self.last_config.lock().unwrap() = config;
        let id = DeploymentId::fresh();
        self.live.lock().unwrap().insert(id.clone(), instances);

        if !self.silent_refs.lock().unwrap().contains(unit_ref) {
            for _ in 0..instances {
                self.reporter.app_ready()?;
            }
        }
        Ok(id)
    }
}

#[async_trait]
impl UnitDeployer for StubDeployer {
    async fn deploy(
        &self,
        unit_ref: &str,
        config: Option<serde_json::Value>,
        instances: u32,
    ) -> HarnessResult<DeploymentId> {
        self.admit(unit_ref, config, instances).await
    }

    async fn deploy_worker(
        &self,
        unit_ref: &str,
        config: Option<serde_json::Value>,
        instances: u32,
    ) -> HarnessResult<DeploymentId> {
        self.worker_deploys.fetch_add(1, Ordering::SeqCst);
        self.admit(unit_ref, config, instances).await
    }

    async fn deploy_module(
        &self,
        module_name: &str,
        config: Option<serde_json::Value>,
        instances: u32,
    ) -> HarnessResult<DeploymentId> {
        self.module_deploys.fetch_add(1, Ordering::SeqCst);
        self.admit(module_name, config, instances).await
    }

    async fn undeploy(&self, id: &DeploymentId) -> HarnessResult<()> {
        self.undeploy_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_undeploys.load(Ordering::SeqCst) {
            return Err(HarnessError::Deploy {
                message: format!("Induced undeploy failure for {id}"),
            });
        }

        let instances = self
            .live
            .lock()
            .unwrap()
            .remove(id)
            .ok_or_else(|| HarnessError::Deploy {
                message: format!("Unknown deployment: {id}"),
            })?;
        for _ in 0..instances {
            self.reporter.app_stopped()?;
        }
        Ok(())
    }

    async fn list_instance_counts(&self) -> HashMap<DeploymentId, u32> {
        self.live.lock().unwrap().clone()
    }

    async fn check_no_leaked_modules(&self) -> usize {
        self.leaked_modules.load(Ordering::SeqCst)
    }
}
