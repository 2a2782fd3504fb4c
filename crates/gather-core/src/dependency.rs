//! Declared dependencies and the per-profile groups a source reports them in.

use crate::profile::Profile;
use crate::version::VersionRange;
use serde::{Deserialize, Serialize};

/// A single declared dependency: a target id and the (opaque) range of
/// versions that satisfy it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    id: String,
    range: VersionRange,
}

impl Dependency {
    #[must_use]
    pub fn new(id: impl Into<String>, range: impl Into<VersionRange>) -> Self {
        Self {
            id: id.into(),
            range: range.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn range(&self) -> &VersionRange {
        &self.range
    }
}

/// A set of dependencies declared for one target profile.
///
/// Sources report one group per profile they have metadata for; narrowing
/// (see [`Profile::nearest_compatible`]) selects a single group for the
/// caller's requested target profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGroup {
    profile: Profile,
    dependencies: Vec<Dependency>,
}

impl DependencyGroup {
    #[must_use]
    pub fn new(profile: Profile, dependencies: Vec<Dependency>) -> Self {
        Self {
            profile,
            dependencies,
        }
    }

    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Narrow `groups` to the single group nearest-compatible with `target`,
    /// per the profile compatibility chain — not declaration order.
    #[must_use]
    pub fn narrow<'a>(groups: &'a [DependencyGroup], target: &Profile) -> Option<&'a DependencyGroup> {
        let profiles: Vec<Profile> = groups.iter().map(|g| g.profile.clone()).collect();
        let nearest = target.nearest_compatible(&profiles)?;
        groups.iter().find(|g| &g.profile == nearest)
    }
}
