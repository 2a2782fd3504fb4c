//! Version and version-range representation.
//!
//! Versions are modeled as four-component (major.minor.build.revision)
//! values with an optional prerelease label, matching the richer scheme the
//! upstream ecosystem this crate interoperates with actually uses rather
//! than plain semver. `VersionRange` stays opaque here: the gather core
//! never evaluates a range against a version, it only stores, compares for
//! equality, and forwards ranges to the resolver.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// A four-component version with an optional prerelease label.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Version {
    major: u64,
    minor: u64,
    build: u64,
    revision: u64,
    prerelease: Option<String>,
}

impl Version {
    #[must_use]
    pub fn new(major: u64, minor: u64, build: u64, revision: u64) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
            prerelease: None,
        }
    }

    #[must_use]
    pub fn with_prerelease(mut self, prerelease: impl Into<String>) -> Self {
        self.prerelease = Some(prerelease.into());
        self
    }

    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    #[must_use]
    pub fn major(&self) -> u64 {
        self.major
    }

    /// Parse a dotted version string, defaulting missing trailing
    /// components to zero so `1.0` and `1.0.0.0` compare equal.
    pub fn parse(s: &str) -> Result<Self, VersionParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let (numeric, prerelease) = match s.split_once('-') {
            Some((n, p)) => (n, Some(p.to_string())),
            None => (s, None),
        };

        let mut parts = numeric.split('.');
        let mut next = |label: &'static str| -> Result<u64, VersionParseError> {
            parts
                .next()
                .unwrap_or("0")
                .parse::<u64>()
                .map_err(|_| VersionParseError::InvalidComponent {
                    component: label,
                    value: numeric.to_string(),
                })
        };

        let major = next("major")?;
        let minor = next("minor")?;
        let build = next("build")?;
        let revision = next("revision")?;

        if parts.next().is_some() {
            return Err(VersionParseError::TooManyComponents {
                value: numeric.to_string(),
            });
        }

        Ok(Self {
            major,
            minor,
            build,
            revision,
            prerelease,
        })
    }
}

/// Errors raised while parsing a [`Version`] from its textual form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    #[error("version string is empty")]
    Empty,
    #[error("invalid {component} component in version {value:?}")]
    InvalidComponent {
        component: &'static str,
        value: String,
    },
    #[error("version {value:?} has more than four numeric components")]
    TooManyComponents { value: String },
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.build.cmp(&other.build))
            .then(self.revision.cmp(&other.revision))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                // A release outranks any prerelease of the same numeric version.
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.build.hash(state);
        self.revision.hash(state);
        self.prerelease.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.build, self.revision)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

/// The shape of a floating version range specifier, e.g. `*` or `1.2.*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Floating {
    /// Matches any version (`*`).
    Wildcard,
    /// Matches any version sharing the given prefix (`1.*`, `1.2.*`).
    Prefix,
}

/// An opaque version range, passed through the gather core unevaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionRange {
    raw: String,
    #[serde(skip)]
    floating: Option<Floating>,
}

impl VersionRange {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let floating = if raw.trim() == "*" {
            Some(Floating::Wildcard)
        } else if raw.trim().ends_with(".*") {
            Some(Floating::Prefix)
        } else {
            None
        };
        Self { raw, floating }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn floating(&self) -> Option<Floating> {
        self.floating
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<&str> for VersionRange {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
