//! Process-wide tracing setup shared by the engine's binaries, tests and benches.

/// Tracing configuration (filters, formatters).
pub mod tracing;

pub use crate::tracing::{LogFormat, TracingConfig};

/// Initialize process-wide tracing with JSON output and `RUST_LOG` filtering
/// (default `info`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    crate::tracing::init(&TracingConfig::default());
}

/// Human-readable output captured by the test harness (default `debug`).
pub fn init_for_tests() {
    crate::tracing::init(&TracingConfig {
        default_filter: "debug".to_string(),
        format: LogFormat::Pretty,
        test_writer: true,
    });
}
