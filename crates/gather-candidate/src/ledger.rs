//! Per-source ledger of already-queried package ids.

use dashmap::DashMap;
use gather_core::SourceRef;
use parking_lot::RwLock;
use std::collections::HashSet;

/// Tracks, per source, which package ids have already been queried this
/// gather. Append-only and monotonic: once an id is marked queried for a
/// source it is never unmarked, matching the fixed-point loop's termination
/// argument (each pass can only shrink the remaining frontier).
#[derive(Debug, Default)]
pub struct QueriedLedger {
    queried: DashMap<SourceRef, RwLock<HashSet<String>>>,
}

impl QueriedLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queried: DashMap::new(),
        }
    }

    /// Mark `id` as queried for `source`. Returns `true` if this is the
    /// first time it has been marked (i.e. it was actually new work).
    pub fn mark_queried(&self, source: &SourceRef, id: &str) -> bool {
        let entry = self.queried.entry(source.clone()).or_default();
        let mut set = entry.write();
        set.insert(id.to_lowercase())
    }

    #[must_use]
    pub fn is_queried(&self, source: &SourceRef, id: &str) -> bool {
        self.queried
            .get(source)
            .is_some_and(|set| set.read().contains(&id.to_lowercase()))
    }

    /// Ids from `candidates` not yet queried for `source`.
    #[must_use]
    pub fn unqueried<'a>(&self, source: &SourceRef, candidates: &'a [String]) -> Vec<&'a str> {
        candidates
            .iter()
            .filter(|id| !self.is_queried(source, id))
            .map(String::as_str)
            .collect()
    }
}
