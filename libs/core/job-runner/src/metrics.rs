//! Prometheus metrics for job workers

use crate::error::ErrorCategory;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::time::Duration;
use tracing::{info, warn};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder.
///
/// Call this once at startup. Subsequent calls are no-ops, and a recorder
/// installed by someone else is left alone.
pub fn init_metrics() {
    if PROMETHEUS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = PROMETHEUS_HANDLE.set(handle);
            info!("Prometheus metrics initialized");
        }
        Err(e) => warn!(error = %e, "Metrics recorder not installed"),
    }
}

/// Render metrics in Prometheus format
pub fn render_metrics() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_default()
}

/// Job worker metrics helper
#[derive(Debug, Clone)]
pub struct WorkerMetrics {
    queue_name: String,
    processor_name: String,
}

impl WorkerMetrics {
    pub fn new(queue_name: impl Into<String>, processor_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            processor_name: processor_name.into(),
        }
    }

    pub fn job_received(&self) {
        counter!(
            "job_runner_jobs_received_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);
    }

    pub fn job_succeeded(&self, duration: Duration) {
        counter!(
            "job_runner_jobs_processed_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone(),
            "status" => "success"
        )
        .increment(1);

        histogram!(
            "job_runner_job_duration_seconds",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .record(duration.as_secs_f64());
    }

    pub fn job_retried(&self) {
        counter!(
            "job_runner_jobs_retried_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);
    }

    /// A job reached a terminal failure.
    pub fn job_failed(&self, category: ErrorCategory) {
        counter!(
            "job_runner_jobs_processed_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone(),
            "status" => "failed"
        )
        .increment(1);

        counter!(
            "job_runner_jobs_failed_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone(),
            "category" => category.as_str()
        )
        .increment(1);
    }

    /// The worker stopped before a job could run again.
    pub fn job_cancelled(&self) {
        counter!(
            "job_runner_jobs_processed_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone(),
            "status" => "cancelled"
        )
        .increment(1);
    }

    /// A payload that could not be decoded was dropped.
    pub fn job_dropped(&self) {
        counter!(
            "job_runner_jobs_dropped_total",
            "queue" => self.queue_name.clone()
        )
        .increment(1);
    }
}
