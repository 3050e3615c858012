//! Slow-operation telemetry.
//!
//! Services report elapsed time for operations that crossed a threshold
//! through [`TelemetryRecorder`], so tests can observe what was reported
//! without a global recorder.

use std::time::Duration;

/// Hash computations at or above the hash threshold.
pub const LONG_COMPUTE_HASH: &str = "duplicate_finder_long_compute_hash_ms";

/// Search-by-hash calls at or above the search threshold.
pub const LONG_SEARCH_BY_HASH: &str = "duplicate_finder_long_search_by_hash_ms";

/// Wall time of every disposition check.
pub const DISPOSITION_CHECK_DURATION: &str = "disposition_check_duration_ms";

/// Sink for named duration metrics.
pub trait TelemetryRecorder: Send + Sync {
    /// Records one duration under `name`.
    fn record_duration(&self, name: &'static str, elapsed: Duration);
}

/// Records durations as `metrics` histograms in milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsTelemetry;

impl MetricsTelemetry {
    /// Creates the recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TelemetryRecorder for MetricsTelemetry {
    #[allow(clippy::cast_precision_loss)]
    fn record_duration(&self, name: &'static str, elapsed: Duration) {
        let ms = elapsed.as_millis() as f64;
        metrics::histogram!(name).record(ms);
        tracing::info!(metric = name, elapsed_ms = ms, "Slow operation");
    }
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetryRecorder for NoopTelemetry {
    fn record_duration(&self, _name: &'static str, _elapsed: Duration) {}
}
