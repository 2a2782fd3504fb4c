//! Package dependency records and their source provenance.

use crate::dependency::Dependency;
use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifies the source a record was obtained from.
///
/// Cheap to clone: interns the source's name behind an `Arc<str>`, matching
/// the identifier-interning convention used for package names elsewhere in
/// this workspace.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct SourceRef(Arc<str>);

impl SourceRef {
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for SourceRef {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl std::hash::Hash for SourceRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceRef {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

/// A package's resolved metadata as reported by one source: its identity,
/// whether it is listed (visible in search/browse), and its dependencies
/// already narrowed to the caller's target profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    identity: Identity,
    listed: bool,
    dependencies: Vec<Dependency>,
}

impl Record {
    #[must_use]
    pub fn new(identity: Identity, listed: bool, dependencies: Vec<Dependency>) -> Self {
        Self {
            identity,
            listed,
            dependencies,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn listed(&self) -> bool {
        self.listed
    }

    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }
}

/// A [`Record`] tagged with the source it came from.
///
/// Equality and hashing include the source: the same identity reported by
/// two different sources is two distinct entries, never collapsed into one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceTaggedRecord {
    record: Record,
    source: SourceRef,
}

impl SourceTaggedRecord {
    #[must_use]
    pub fn new(record: Record, source: SourceRef) -> Self {
        Self { record, source }
    }

    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    #[must_use]
    pub fn source(&self) -> &SourceRef {
        &self.source
    }
}

impl std::hash::Hash for Record {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
        self.listed.hash(state);
        // Dependencies intentionally excluded: a record is keyed by identity,
        // not by the dependency payload it happens to carry.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;
    use pretty_assertions::assert_eq;

    fn identity() -> Identity {
        Identity::new("foo/bar", Version::new(1, 0, 0, 0))
    }

    #[test]
    fn same_identity_different_source_is_distinct() {
        let record = Record::new(identity(), true, vec![]);
        let a = SourceTaggedRecord::new(record.clone(), SourceRef::new("source-a"));
        let b = SourceTaggedRecord::new(record, SourceRef::new("source-b"));
        assert_ne!(a, b);
    }

    #[test]
    fn same_identity_and_source_is_equal() {
        let record = Record::new(identity(), true, vec![]);
        let a = SourceTaggedRecord::new(record.clone(), SourceRef::new("source-a"));
        let b = SourceTaggedRecord::new(record, SourceRef::new("source-a"));
        assert_eq!(a, b);
    }
}
