//! RAII-based timing for history operations.
//!
//! ```rust,ignore
//! use citadelle_util::timing::TimingGuard;
//!
//! let _timing = TimingGuard::diff(old_lines, new_lines);
//! // ... compute the diff ...
//! // Duration is logged when _timing is dropped
//! ```

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// RAII guard that logs the duration of an operation when dropped.
pub struct TimingGuard {
    /// Kind of operation (e.g. "diff", "persist").
    operation_type: &'static str,
    /// Free-form detail about this run.
    operation_name: String,
    start: Instant,
    /// At or above this, log at info instead of debug.
    info_threshold_ms: u64,
    /// At or above this, log at warn.
    warn_threshold_ms: u64,
}

impl TimingGuard {
    pub fn new(operation_type: &'static str, operation_name: impl Into<String>) -> Self {
        Self {
            operation_type,
            operation_name: operation_name.into(),
            start: Instant::now(),
            info_threshold_ms: 100,
            warn_threshold_ms: 2000,
        }
    }

    /// Timing guard for a line diff of the given dimensions.
    pub fn diff(old_lines: usize, new_lines: usize) -> Self {
        Self::new("diff", format!("{old_lines}x{new_lines}"))
    }

    /// Timing guard for a write-through of the history collection.
    pub fn persist(key: &str) -> Self {
        Self::new("persist", key)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.2}s", ms as f64 / 1000.0)
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let duration_ms = elapsed.as_millis() as u64;
        let duration = format_duration(elapsed);

        if duration_ms >= self.warn_threshold_ms {
            warn!(
                operation_type = self.operation_type,
                operation_name = %self.operation_name,
                duration_ms,
                duration = %duration,
                "Slow operation completed"
            );
        } else if duration_ms >= self.info_threshold_ms {
            info!(
                operation_type = self.operation_type,
                operation_name = %self.operation_name,
                duration_ms,
                duration = %duration,
                "Operation completed"
            );
        } else {
            debug!(
                operation_type = self.operation_type,
                operation_name = %self.operation_name,
                duration_ms,
                "Operation completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_timing_guard_measures() {
        let guard = TimingGuard::diff(3, 4);
        sleep(Duration::from_millis(5));
        assert!(guard.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_persist_guard_drops_cleanly() {
        let guard = TimingGuard::persist("citadelle-versions");
        assert!(guard.elapsed() < Duration::from_secs(60));
        drop(guard);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(42)), "42ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }
}
