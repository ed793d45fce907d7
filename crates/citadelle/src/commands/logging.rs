//! Logging initialization.

use citadelle_util::log::{self, LogConfig, LogLevel};

/// Initialize logging to stderr.
///
/// `--verbose` wins over the configured level; `RUST_LOG` wins over both.
pub fn init_logging(verbose: bool, configured: Option<LogLevel>) {
    let level = if verbose {
        LogLevel::Debug
    } else {
        configured.unwrap_or_default()
    };

    let installed = log::init(LogConfig {
        level,
        include_location: verbose,
        ..Default::default()
    });
    if !installed {
        tracing::debug!("Logging already initialized");
    }
}
