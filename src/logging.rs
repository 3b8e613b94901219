// ==========================================
// PrintFlow APS - Logging initialization
// ==========================================
// tracing + tracing-subscriber, level driven by
// RUST_LOG (default: info).
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the process-wide subscriber.
///
/// # Environment
/// - `RUST_LOG`: filter string (e.g. `debug` or `printflow_aps=trace`)
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// Initialize logging for tests. Safe to call repeatedly.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
