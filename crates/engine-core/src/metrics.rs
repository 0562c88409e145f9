use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    targets_submitted: AtomicU64,
    jobs_created: AtomicU64,
    poll_ticks: AtomicU64,
    poll_failures: AtomicU64,
    reports_fetched: AtomicU64,
    rows_written: AtomicU64,
}

/// Run-wide counters, cheap to clone and shared by every sheet pipeline.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub targets_submitted: u64,
    pub jobs_created: u64,
    pub poll_ticks: u64,
    pub poll_failures: u64,
    pub reports_fetched: u64,
    pub rows_written: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_targets(&self, count: u64) {
        self.inner
            .targets_submitted
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_jobs(&self, count: u64) {
        self.inner.jobs_created.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_poll_ticks(&self, count: u64) {
        self.inner.poll_ticks.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_poll_failures(&self, count: u64) {
        self.inner.poll_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_reports(&self, count: u64) {
        self.inner.reports_fetched.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_rows_written(&self, count: u64) {
        self.inner.rows_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            targets_submitted: self.inner.targets_submitted.load(Ordering::Relaxed),
            jobs_created: self.inner.jobs_created.load(Ordering::Relaxed),
            poll_ticks: self.inner.poll_ticks.load(Ordering::Relaxed),
            poll_failures: self.inner.poll_failures.load(Ordering::Relaxed),
            reports_fetched: self.inner.reports_fetched.load(Ordering::Relaxed),
            rows_written: self.inner.rows_written.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
