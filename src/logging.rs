//! Tracing subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`; defaults to `info` for this crate and `warn`
/// elsewhere. Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,atheno_data=info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
