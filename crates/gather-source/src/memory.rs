//! An in-memory [`SourceQueryCapability`] fixture, used by tests and the
//! demo binary's offline mode.

use crate::capability::SourceQueryCapability;
use ahash::AHashMap;
use async_trait::async_trait;
use gather_core::{Identity, Profile, Record, SourceError};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

/// A fixed set of records held in memory, keyed by lowercased package id.
#[derive(Debug, Default)]
pub struct InMemorySource {
    records: RwLock<AHashMap<String, Vec<Record>>>,
}

impl InMemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(AHashMap::new()),
        }
    }

    /// Register a record under its identity's id.
    pub fn add(&self, record: Record) {
        let key = record.identity().id_key();
        self.records.write().entry(key).or_default().push(record);
    }
}

#[async_trait]
impl SourceQueryCapability for InMemorySource {
    async fn resolve_by_identity(
        &self,
        identities: &[Identity],
        profile: &Profile,
        include_prerelease: bool,
    ) -> Result<Vec<Record>, SourceError> {
        let records = self.records.read();
        let mut out = Vec::new();
        for identity in identities {
            if let Some(versions) = records.get(&identity.id_key()) {
                out.extend(
                    versions
                        .iter()
                        .filter(|r| r.identity() == identity)
                        .filter(|r| include_prerelease || !r.identity().version().is_prerelease())
                        .cloned(),
                );
            }
        }
        let _ = profile;
        Ok(out)
    }

    async fn resolve_by_id(
        &self,
        id: &str,
        _profile: &Profile,
        include_prerelease: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<Record>, SourceError> {
        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }
        let records = self.records.read();
        let out = records
            .get(&id.to_lowercase())
            .map(|versions| {
                versions
                    .iter()
                    .filter(|r| include_prerelease || !r.identity().version().is_prerelease())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(out)
    }
}
