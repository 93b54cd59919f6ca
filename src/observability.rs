//! Logging setup and in-process counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";

/// Install the global fmt subscriber, honouring `RUST_LOG`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    tasks_accepted: AtomicU64,
    items_succeeded: AtomicU64,
    items_failed: AtomicU64,
    observers_attached: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_accepted(&self) {
        self.tasks_accepted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "tasks_accepted", "Metric incremented");
    }

    pub fn item_succeeded(&self) {
        self.items_succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "items_succeeded", "Metric incremented");
    }

    pub fn item_failed(&self) {
        self.items_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "items_failed", "Metric incremented");
    }

    pub fn observer_attached(&self) {
        self.observers_attached.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "observers_attached", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tasks_accepted: self.tasks_accepted.load(Ordering::Relaxed),
            items_succeeded: self.items_succeeded.load(Ordering::Relaxed),
            items_failed: self.items_failed.load(Ordering::Relaxed),
            observers_attached: self.observers_attached.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub tasks_accepted: u64,
    pub items_succeeded: u64,
    pub items_failed: u64,
    pub observers_attached: u64,
}
