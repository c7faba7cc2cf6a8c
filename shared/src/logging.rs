//! Shared logging setup for the harness and for test binaries

use tracing_subscriber::EnvFilter;

/// Initialize the stdout tracing subscriber for a test driver process.
///
/// Honors `RUST_LOG` when set; otherwise falls back to the given base level
/// for the harness crates and `warn` for everything else.
pub fn init_tracing_with_level(log_level: Option<&str>) {
    let base_level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,harness={base_level},shared={base_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

pub fn init_tracing() {
    init_tracing_with_level(None);
}

/// Initialize tracing inside a test. Safe to call from every test in a
/// binary; only the first call installs the subscriber.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,harness=debug,shared=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_test_writer()
        .try_init();
}
