use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

// --- Metrics -----------------------------------------------------------------

/// Process-wide gateway counters.
///
/// Counters are monotonic and updated with relaxed atomics; a snapshot is
/// only a best-effort view while traffic is flowing.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    sessions_built: AtomicU64,
    build_failures: AtomicU64,
    infer_calls: AtomicU64,
    infer_failures: AtomicU64,
    items_parsed: AtomicU64,
    items_skipped: AtomicU64,
}

impl GatewayMetrics {
    pub(crate) fn record_build(&self, ok: bool) {
        let counter = if ok { &self.sessions_built } else { &self.build_failures };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_infer(&self, run: Option<&InferMetrics>) {
        self.infer_calls.fetch_add(1, Ordering::Relaxed);
        match run {
            Some(run) => {
                self.items_parsed.fetch_add(run.parsed as u64, Ordering::Relaxed);
                self.items_skipped.fetch_add(run.skipped as u64, Ordering::Relaxed);
            }
            None => {
                self.infer_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_built: self.sessions_built.load(Ordering::Relaxed),
            build_failures: self.build_failures.load(Ordering::Relaxed),
            infer_calls: self.infer_calls.load(Ordering::Relaxed),
            infer_failures: self.infer_failures.load(Ordering::Relaxed),
            items_parsed: self.items_parsed.load(Ordering::Relaxed),
            items_skipped: self.items_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`GatewayMetrics`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Sessions built, the default session included.
    pub sessions_built: u64,
    pub build_failures: u64,
    pub infer_calls: u64,
    /// `infer` calls that ended in an engine failure.
    pub infer_failures: u64,
    /// Content items that produced output.
    pub items_parsed: u64,
    /// Content items for which the engine found no parse.
    pub items_skipped: u64,
}

/// Timing and item counts for a single `infer` call.
#[derive(Debug, Default, Clone)]
pub struct InferMetrics {
    /// Content items in the request.
    pub items: usize,
    pub parsed: usize,
    pub skipped: usize,
    /// Time spent waiting for the session lock.
    pub lock_wait: Duration,
    /// Time spent inside the lock (read + parse + format).
    pub pipeline: Duration,
}
