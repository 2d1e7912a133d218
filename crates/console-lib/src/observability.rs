//! Observability infrastructure for the control console
//!
//! Provides:
//! - Prometheus metrics (lifecycle operations, service status, analysis latency)
//! - Structured JSON-friendly event logging with tracing

use crate::lifecycle::LifecycleReport;
use crate::models::{ServiceName, ServiceStatus, StatusSnapshot};
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge_vec, Histogram, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for lifecycle commands (in seconds)
const LIFECYCLE_BUCKETS: &[f64] = &[0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0];

/// Histogram buckets for analysis requests (in seconds)
const ANALYSIS_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ConsoleMetricsInner> = OnceLock::new();

struct ConsoleMetricsInner {
    lifecycle_operations: IntCounterVec,
    lifecycle_duration_seconds: HistogramVec,
    service_up: IntGaugeVec,
    status_refreshes: IntCounter,
    analysis_requests: IntCounterVec,
    analysis_latency_seconds: Histogram,
}

impl ConsoleMetricsInner {
    fn new() -> Self {
        Self {
            lifecycle_operations: register_int_counter_vec!(
                "fir_console_lifecycle_operations_total",
                "Lifecycle operations by operation and outcome",
                &["operation", "outcome"]
            )
            .expect("Failed to register lifecycle_operations_total"),

            lifecycle_duration_seconds: register_histogram_vec!(
                "fir_console_lifecycle_duration_seconds",
                "Wall-clock duration of lifecycle operations",
                &["operation"],
                LIFECYCLE_BUCKETS.to_vec()
            )
            .expect("Failed to register lifecycle_duration_seconds"),

            service_up: register_int_gauge_vec!(
                "fir_console_service_up",
                "1 if the service answered its health probe with HTTP 200",
                &["service"]
            )
            .expect("Failed to register service_up"),

            status_refreshes: register_int_counter!(
                "fir_console_status_refreshes_total",
                "Number of committed status refreshes"
            )
            .expect("Failed to register status_refreshes_total"),

            analysis_requests: register_int_counter_vec!(
                "fir_console_analysis_requests_total",
                "Narrative analysis requests by outcome",
                &["outcome"]
            )
            .expect("Failed to register analysis_requests_total"),

            analysis_latency_seconds: register_histogram!(
                "fir_console_analysis_latency_seconds",
                "Round-trip time of analysis requests",
                ANALYSIS_BUCKETS.to_vec()
            )
            .expect("Failed to register analysis_latency_seconds"),
        }
    }
}

/// Console metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ConsoleMetrics {
    _private: (),
}

impl Default for ConsoleMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ConsoleMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ConsoleMetricsInner {
        GLOBAL_METRICS.get_or_init(ConsoleMetricsInner::new)
    }

    /// Record a finished lifecycle operation
    pub fn record_lifecycle(&self, operation: &str, outcome: &str, duration_secs: f64) {
        let inner = self.inner();
        inner
            .lifecycle_operations
            .with_label_values(&[operation, outcome])
            .inc();
        inner
            .lifecycle_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    /// Count a lifecycle call that never ran, leaving the duration untouched
    pub fn count_lifecycle(&self, operation: &str, outcome: &str) {
        self.inner()
            .lifecycle_operations
            .with_label_values(&[operation, outcome])
            .inc();
    }

    /// Publish the statuses of a committed snapshot
    pub fn record_snapshot(&self, snapshot: &StatusSnapshot) {
        let inner = self.inner();
        inner.status_refreshes.inc();
        for (service, status) in snapshot.iter() {
            let up = i64::from(status == ServiceStatus::Running);
            inner
                .service_up
                .with_label_values(&[service.as_str()])
                .set(up);
        }
    }

    /// Record a finished analysis request
    pub fn record_analysis(&self, outcome: &str, duration_secs: f64) {
        let inner = self.inner();
        inner.analysis_requests.with_label_values(&[outcome]).inc();
        inner.analysis_latency_seconds.observe(duration_secs);
    }

    /// Count an analysis request rejected before it was sent
    pub fn count_analysis(&self, outcome: &str) {
        self.inner()
            .analysis_requests
            .with_label_values(&[outcome])
            .inc();
    }
}

/// Structured logger for console events
///
/// Provides consistent logging for lifecycle operations, status refreshes
/// and process start/stop, tagged with the managed stack name.
#[derive(Clone)]
pub struct StructuredLogger {
    stack: String,
}

impl StructuredLogger {
    pub fn new(stack: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
        }
    }

    /// Log console startup
    pub fn log_startup(&self, version: &str, surface: &str) {
        info!(
            event = "console_started",
            stack = %self.stack,
            version = %version,
            surface = %surface,
            "FIR Assist console started"
        );
    }

    /// Log console shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "console_shutdown",
            stack = %self.stack,
            reason = %reason,
            "FIR Assist console shutting down"
        );
    }

    /// Log the outcome of a lifecycle operation
    pub fn log_lifecycle(&self, report: &LifecycleReport, duration_secs: f64) {
        if report.result.succeeded {
            info!(
                event = "lifecycle_completed",
                stack = %self.stack,
                operation = %report.operation,
                state = %report.state,
                warnings = report.warnings.len(),
                duration_secs = duration_secs,
                message = %report.result.message,
                "Lifecycle operation completed"
            );
        } else {
            warn!(
                event = "lifecycle_failed",
                stack = %self.stack,
                operation = %report.operation,
                state = %report.state,
                duration_secs = duration_secs,
                message = %report.result.message,
                exit_detail = ?report.result.exit_detail,
                "Lifecycle operation failed"
            );
        }

        for warning in &report.warnings {
            warn!(
                event = "lifecycle_inconsistency",
                stack = %self.stack,
                operation = %report.operation,
                warning = %warning,
                "Status does not match lifecycle outcome"
            );
        }
    }

    /// Log a rejected lifecycle request
    pub fn log_rejected(&self, operation: &str, reason: &str) {
        warn!(
            event = "lifecycle_rejected",
            stack = %self.stack,
            operation = %operation,
            reason = %reason,
            "Lifecycle operation rejected"
        );
    }

    /// Log a committed status refresh
    pub fn log_refresh(&self, snapshot: &StatusSnapshot) {
        info!(
            event = "status_refreshed",
            stack = %self.stack,
            generation = snapshot.generation,
            frontend = %snapshot.get(ServiceName::Frontend),
            backend = %snapshot.get(ServiceName::Backend),
            datastore = %snapshot.get(ServiceName::Datastore),
            "Service status refreshed"
        );
    }
}
