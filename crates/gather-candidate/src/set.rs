//! The candidate set: a concurrent, deduplicated accumulator of source-tagged
//! records discovered during a gather.

use ahash::RandomState;
use dashmap::DashMap;
use gather_core::{SourceRef, SourceTaggedRecord};

/// Key under which a [`SourceTaggedRecord`] is deduplicated: identity plus
/// source, since the same identity reported by two sources is kept as two
/// distinct entries (see [`SourceTaggedRecord`]'s equality semantics).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateKey {
    id_key: String,
    version: String,
    source: SourceRef,
}

impl CandidateKey {
    fn from_record(record: &SourceTaggedRecord) -> Self {
        Self {
            id_key: record.record().identity().id_key(),
            version: record.record().identity().version().to_string(),
            source: record.source().clone(),
        }
    }
}

/// Concurrent, dedup-on-insert set of discovered [`SourceTaggedRecord`]s.
///
/// `insert` is lock-free and safe to call from any number of concurrent
/// tasks; no ordering between inserts is observable from outside.
#[derive(Debug, Default)]
pub struct CandidateSet {
    records: DashMap<CandidateKey, SourceTaggedRecord, RandomState>,
}

impl CandidateSet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: DashMap::with_hasher(RandomState::default()),
        }
    }

    /// Insert a record, returning `true` if it was not already present.
    pub fn insert(&self, record: SourceTaggedRecord) -> bool {
        let key = CandidateKey::from_record(&record);
        match self.records.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    /// A point-in-time snapshot of every record collected so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SourceTaggedRecord> {
        self.records.iter().map(|entry| entry.value().clone()).collect()
    }

    /// The distinct lowercased package ids discovered so far, across all
    /// sources — the driver's frontier for the next fixed-point pass.
    #[must_use]
    pub fn known_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .records
            .iter()
            .map(|entry| entry.key().id_key.clone())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
