//! Tracing/logging setup shared by every process embedding the ACM crates.

/// Initialize logging from `RUST_LOG` (default `info`), JSON output.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize logging with explicit settings.
pub fn init_with(settings: &LogSettings) {
    tracing::init_with(settings);
}

/// Subscriber configuration (filters, output format).
pub mod tracing;

pub use tracing::{LogFormat, LogSettings, LogSettingsError};
