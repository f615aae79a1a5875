//! Prometheus metrics for prediction service observability
//!
//! Exposes metrics at /metrics endpoint for scraping by Prometheus.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::time::Duration;

/// Global Prometheus handle
static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Metric names
pub const PREDICT_REQUESTS: &str = "predict_requests_total";
pub const PREDICT_ROWS: &str = "predict_rows_total";
pub const PREDICT_FAILURES: &str = "predict_failures_total";
pub const PREDICT_LATENCY: &str = "predict_latency_seconds";
pub const UPLOADS_TOTAL: &str = "uploads_total";
pub const SESSIONS_ACTIVE: &str = "upload_sessions_active";

/// Prediction entry points, used as the `mode` label
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Manual,
    Batch,
}

impl Mode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Batch => "batch",
        }
    }
}

/// Initialize the metrics system.
///
/// Installs the global recorder; a second call is a no-op.
pub fn init_metrics() -> Result<(), BuildError> {
    let mut installed = false;
    METRICS_HANDLE.get_or_try_init(|| {
        installed = true;
        PrometheusBuilder::new().install_recorder()
    })?;
    if !installed {
        tracing::debug!("Metrics system already initialized");
        return Ok(());
    }

    // Describe metrics for Prometheus
    describe_counter!(PREDICT_REQUESTS, "Total number of prediction requests");
    describe_counter!(PREDICT_ROWS, "Total number of rows scored");
    describe_counter!(PREDICT_FAILURES, "Failed requests by reason");
    describe_histogram!(PREDICT_LATENCY, "Prediction latency in seconds");
    describe_counter!(UPLOADS_TOTAL, "Total number of CSV uploads");
    describe_gauge!(SESSIONS_ACTIVE, "Number of live upload sessions");

    tracing::info!("Metrics system initialized");
    Ok(())
}

/// Handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    METRICS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

// ============================================================================
// Prediction Metrics
// ============================================================================

/// Record a completed prediction over `rows` rows
pub fn record_prediction(mode: Mode, rows: usize, duration: Duration) {
    counter!(PREDICT_REQUESTS, "mode" => mode.as_str()).increment(1);
    counter!(PREDICT_ROWS, "mode" => mode.as_str()).increment(rows as u64);
    histogram!(PREDICT_LATENCY, "mode" => mode.as_str()).record(duration.as_secs_f64());
}

/// Record a failed request
pub fn record_failure(reason: &'static str) {
    counter!(PREDICT_FAILURES, "reason" => reason).increment(1);
}

// ============================================================================
// Upload Metrics
// ============================================================================

/// Record an accepted upload
pub fn record_upload() {
    counter!(UPLOADS_TOTAL).increment(1);
}

/// Set the number of live upload sessions
pub fn set_active_sessions(count: usize) {
    gauge!(SESSIONS_ACTIVE).set(count as f64);
}
