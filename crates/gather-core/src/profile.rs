//! Target profiles and the nearest-compatible-framework narrowing rule.
//!
//! A real registry's compatibility matrix is large; this is a compact table
//! covering enough named profiles and generations to make the narrowing
//! rule concrete and testable without trying to be exhaustive.

use serde::{Deserialize, Serialize};

/// A target framework profile, e.g. `net8.0` or `netstandard2.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Profile {
    name: String,
}

impl Profile {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Profiles compatible with `self`, nearest first, including `self`.
    ///
    /// Order matters: when more than one declared dependency group's
    /// profile is compatible, the nearest one in this list wins, not the
    /// order the groups were declared in.
    #[must_use]
    pub fn compatibility_chain(&self) -> Vec<Profile> {
        compatibility_table()
            .into_iter()
            .find(|chain| chain.first().map(Profile::name) == Some(self.name()))
            .unwrap_or_else(|| vec![self.clone()])
    }

    /// Select the nearest-compatible profile among `candidates`, per the
    /// order `compatibility_chain` returns, or `None` if nothing matches.
    #[must_use]
    pub fn nearest_compatible<'a>(&self, candidates: &'a [Profile]) -> Option<&'a Profile> {
        self.compatibility_chain()
            .iter()
            .find_map(|wanted| candidates.iter().find(|c| *c == wanted))
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn compatibility_table() -> Vec<Vec<Profile>> {
    let chain = |names: &[&str]| names.iter().map(|n| Profile::new(*n)).collect::<Vec<_>>();
    vec![
        chain(&["net9.0", "net8.0", "netstandard2.1", "netstandard2.0"]),
        chain(&["net8.0", "netstandard2.1", "netstandard2.0"]),
        chain(&["net7.0", "net6.0", "netstandard2.1", "netstandard2.0"]),
        chain(&["net6.0", "netstandard2.1", "netstandard2.0"]),
        chain(&["netstandard2.1", "netstandard2.0"]),
        chain(&["netstandard2.0"]),
    ]
}
