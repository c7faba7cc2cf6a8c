//! Common test utilities and infrastructure
//!
//! Shared fixtures and helpers used across the harness test suites.

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
#[allow(unused_imports)]
pub use fixtures::{StubDeployer, TestFixtures};
#[allow(unused_imports)]
pub use helpers::{ready_run, spawn_echo_unit, spawn_failing_unit, stub_session};
