//! Test helpers for driving the harness suites
//!
//! Small constructors that cut the boilerplate of wiring a channel, a
//! scripted deployer and a subscribed run, plus spawners for unit tasks
//! that react to test announcements the way deployed code would.

#![allow(dead_code)] // Each test binary uses a subset of these utilities

use harness::{TestRun, TestSession};
use shared::{EventChannel, TestReporter};
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::fixtures::StubDeployer;

/// Session wired to a fresh channel and a scripted deployer.
pub fn stub_session() -> (TestSession, Arc<StubDeployer>) {
    shared::logging::init_test_tracing();
    let channel = EventChannel::default();
    let deployer = Arc::new(StubDeployer::new(TestReporter::new(channel.clone())));
    let session = TestSession::with_channel(deployer.clone(), channel);
    (session, deployer)
}

/// A run bound to `session` with its subscription already installed.
pub async fn ready_run(session: &TestSession) -> TestRun {
    let run = TestRun::new(session);
    run.setup()
        .await
        .expect("setup should install the subscription");
    run
}

/// Spawn a unit task that completes every announced test after emitting a
/// trace and a passing check.
pub fn spawn_echo_unit(reporter: &TestReporter) -> JoinHandle<()> {
    let reporter = reporter.clone();
    // Subscribe before spawning so no announcement can slip past
    let mut signals = reporter.start_signals();
    tokio::spawn(async move {
        while let Some(name) = signals.next().await {
            let _ = reporter.trace(&format!("echo unit running {name}"));
            let _ = reporter.check(true, "announcement received");
            let _ = reporter.test_complete();
        }
    })
}

/// Spawn a unit task that reports `failures` failed checks for every
/// announced test before completing it.
pub fn spawn_failing_unit(reporter: &TestReporter, failures: usize) -> JoinHandle<()> {
    let reporter = reporter.clone();
    let mut signals = reporter.start_signals();
    tokio::spawn(async move {
        while let Some(name) = signals.next().await {
            for i in 0..failures {
                let _ = reporter.check(false, &format!("{name} check {i}"));
            }
            let _ = reporter.test_complete();
        }
    })
}
