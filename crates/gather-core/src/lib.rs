//! Data model for the cross-source dependency gather subsystem.
//!
//! This crate owns the types that flow across the Source Query Capability
//! boundary: package identities, version ranges, dependency groups, and the
//! source-tagged records the gather driver assembles. It does not talk to
//! any network or evaluate version ranges itself.

mod dependency;
mod error;
mod identity;
mod profile;
mod record;
mod version;

pub use dependency::{Dependency, DependencyGroup};
pub use error::{GatherError, SourceError};
pub use identity::Identity;
pub use profile::Profile;
pub use record::{Record, SourceRef, SourceTaggedRecord};
pub use version::{Floating, Version, VersionRange};
