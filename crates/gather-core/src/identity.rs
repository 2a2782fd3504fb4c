//! Package identity: a case-insensitive id paired with a normalized version.

use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A fully-resolved package identity: id plus exact version.
///
/// Equality and hashing are case-insensitive on the id and use the
/// normalized [`Version`] comparison, so `Foo/Bar@1.0` and `foo/bar@1.0.0.0`
/// are the same identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    id: String,
    version: Version,
}

impl Identity {
    #[must_use]
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Lowercased id, used as the canonical key for dedup and ledger lookups.
    #[must_use]
    pub fn id_key(&self) -> String {
        self.id.to_lowercase()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq_ignore_ascii_case(&other.id) && self.version == other.version
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id_key().hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn id_is_case_insensitive() {
        let a = Identity::new("Foo/Bar", Version::new(1, 0, 0, 0));
        let b = Identity::new("foo/bar", Version::new(1, 0, 0, 0));
        assert_eq!(a, b);
    }

    #[test]
    fn version_normalization_affects_equality() {
        let a = Identity::new("foo/bar", Version::parse("1.0").unwrap());
        let b = Identity::new("foo/bar", Version::parse("1.0.0.0").unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn different_versions_are_distinct() {
        let a = Identity::new("foo/bar", Version::new(1, 0, 0, 0));
        let b = Identity::new("foo/bar", Version::new(1, 0, 0, 1));
        assert_ne!(a, b);
    }
}
