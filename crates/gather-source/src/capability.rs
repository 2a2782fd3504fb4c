//! The query capability a repository must implement to participate in a
//! gather. Repositories that don't implement it are silently excluded by
//! callers — this is polymorphism by capability, not an error.

use async_trait::async_trait;
use gather_core::{Identity, Profile, Record, SourceError};
use tokio_util::sync::CancellationToken;

/// A source's ability to resolve package metadata, either by exact
/// identity or by id across all versions.
///
/// Implementations must be safe to call concurrently: the gather driver
/// dispatches many `(source, id)` pairs against the same source instance in
/// parallel, bounded only by the caller-configured parallelism.
#[async_trait]
pub trait SourceQueryCapability: Send + Sync {
    /// Resolve metadata for a batch of exact identities, narrowed to
    /// `profile`. Used by the seed pass.
    async fn resolve_by_identity(
        &self,
        identities: &[Identity],
        profile: &Profile,
        include_prerelease: bool,
    ) -> Result<Vec<Record>, SourceError>;

    /// Resolve metadata for every version of `id`, narrowed to `profile`.
    /// Used by each fixed-point pass to expand the frontier.
    async fn resolve_by_id(
        &self,
        id: &str,
        profile: &Profile,
        include_prerelease: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<Record>, SourceError>;
}
