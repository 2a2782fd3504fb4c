//! Gather statistics: atomic counters with a cheap snapshot, matching the
//! teacher's `DownloadStats`/`StatsSnapshot` convention.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Running counters for a single [`crate::gather`] call.
#[derive(Debug, Default)]
pub struct GatherStats {
    pub passes: AtomicUsize,
    pub queries_dispatched: AtomicUsize,
    pub queries_failed: AtomicUsize,
    pub records_discovered: AtomicUsize,
}

impl GatherStats {
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            passes: self.passes.load(Ordering::Relaxed),
            queries_dispatched: self.queries_dispatched.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            records_discovered: self.records_discovered.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`GatherStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub passes: usize,
    pub queries_dispatched: usize,
    pub queries_failed: usize,
    pub records_discovered: usize,
}
