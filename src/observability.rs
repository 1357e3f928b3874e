//! Tracing spans and a cheap poll-based metrics snapshot, in the idiom of
//! the originating workspace's `observability` module: `tracing` for
//! structured logs/spans, a lock-free counters struct for metrics rather
//! than a committed wire format.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters tracked across the monitor pipeline's lifetime. Cloned
/// handles share the same underlying atomics (`Arc`), so the CLI harness
/// and any future HTTP/metrics exporter can poll the same instance the
/// pipeline updates.
#[derive(Clone, Default)]
pub struct PipelineMetrics {
    inner: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    events_in: AtomicU64,
    decisions_out: AtomicU64,
    buffer_drops: AtomicU64,
    workflow_drops: AtomicU64,
    sink_send_failures: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event_in(&self) {
        self.inner.events_in.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decision_out(&self) {
        self.inner.decisions_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_buffer_drop(&self) {
        self.inner.buffer_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_workflow_drop(&self) {
        self.inner.workflow_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sink_send_failure(&self) {
        self.inner.sink_send_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A point-in-time snapshot, safe to serialize or print.
    pub fn snapshot(&self) -> PipelineMetricsSnapshot {
        PipelineMetricsSnapshot {
            events_in: self.inner.events_in.load(Ordering::Relaxed),
            decisions_out: self.inner.decisions_out.load(Ordering::Relaxed),
            buffer_drops: self.inner.buffer_drops.load(Ordering::Relaxed),
            workflow_drops: self.inner.workflow_drops.load(Ordering::Relaxed),
            sink_send_failures: self.inner.sink_send_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PipelineMetricsSnapshot {
    pub events_in: u64,
    pub decisions_out: u64,
    pub buffer_drops: u64,
    pub workflow_drops: u64,
    pub sink_send_failures: u64,
}

/// Installs a `tracing-subscriber` with an env-filter honoring `RUST_LOG`,
/// defaulting to `info`. Intended for the CLI binary's `main()`; library
/// code never installs a global subscriber.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_snapshot() {
        let metrics = PipelineMetrics::new();
        metrics.record_event_in();
        metrics.record_event_in();
        metrics.record_decision_out();
        metrics.record_buffer_drop();

        let snap = metrics.snapshot();
        assert_eq!(snap.events_in, 2);
        assert_eq!(snap.decisions_out, 1);
        assert_eq!(snap.buffer_drops, 1);
        assert_eq!(snap.workflow_drops, 0);
    }

    #[test]
    fn clones_share_underlying_counters() {
        let metrics = PipelineMetrics::new();
        let clone = metrics.clone();
        clone.record_event_in();
        assert_eq!(metrics.snapshot().events_in, 1);
    }
}
