//! The driver: a seed pass followed by a fixed-point loop over per-source
//! `resolve_by_id` calls, bounded by `O(|sources| * |discovered ids|)`.

use crate::stats::GatherStats;
use futures_util::stream::{self, StreamExt};
use gather_candidate::{CandidateSet, QueriedLedger};
use gather_core::{GatherError, Identity, Profile, Record, SourceRef, SourceTaggedRecord};
use gather_source::SourceQueryCapability;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A configured source, tagged with the name its records will be stamped
/// with in the resulting [`SourceTaggedRecord`]s.
#[derive(Clone)]
pub struct NamedSource {
    name: SourceRef,
    capability: Arc<dyn SourceQueryCapability>,
}

impl NamedSource {
    pub fn new(name: SourceRef, capability: Arc<dyn SourceQueryCapability>) -> Self {
        Self { name, capability }
    }
}

/// Caller-configured knobs for a [`gather`] call.
#[derive(Debug, Clone)]
pub struct GatherContext {
    /// Upper bound on concurrently in-flight `(source, id)` queries.
    pub max_parallelism: usize,
    pub include_prerelease: bool,
}

impl Default for GatherContext {
    fn default() -> Self {
        Self {
            max_parallelism: 8,
            include_prerelease: false,
        }
    }
}

/// Gather the transitive dependency metadata closure of `root` across
/// `sources`, narrowed to `target`.
///
/// # Errors
/// Returns [`GatherError::NoSourcesAvailable`] if `sources` is empty, or
/// [`GatherError::Cancelled`] if `cancel` fires before the gather
/// completes. Per-source failures are logged and do not fail the overall
/// gather; see the module-level docs for the propagation policy.
pub async fn gather(
    root: &[Identity],
    target: &Profile,
    sources: &[NamedSource],
    context: &GatherContext,
    cancel: &CancellationToken,
) -> Result<Vec<SourceTaggedRecord>, GatherError> {
    let (candidates, _ledger) = run(root, target, sources, context, cancel).await?;
    Ok(candidates.snapshot())
}

/// The same algorithm as [`gather`], but surfacing the [`CandidateSet`] and
/// [`QueriedLedger`] it drove to a fixed point rather than just the final
/// snapshot — used by property tests to check invariants (coverage,
/// monotonicity) that aren't observable through the public `Vec` result
/// alone.
pub(crate) async fn run(
    root: &[Identity],
    target: &Profile,
    sources: &[NamedSource],
    context: &GatherContext,
    cancel: &CancellationToken,
) -> Result<(CandidateSet, QueriedLedger), GatherError> {
    if sources.is_empty() {
        return Err(GatherError::NoSourcesAvailable);
    }
    if cancel.is_cancelled() {
        return Err(GatherError::Cancelled);
    }

    let candidates = CandidateSet::new();
    let ledger = QueriedLedger::new();
    let stats = GatherStats::default();

    // Race the seed pass against cancellation so a source that blocks
    // inside `resolve_by_identity` doesn't hang the whole gather: firing
    // `cancel` drops the seed-pass future, abandoning whatever queries
    // were still in flight, and returns `Cancelled` immediately.
    tokio::select! {
        _ = seed_pass(root, target, sources, context, &candidates, &ledger, &stats, cancel) => {}
        _ = cancel.cancelled() => return Err(GatherError::Cancelled),
    }
    stats.passes.fetch_add(1, Ordering::Relaxed);

    loop {
        if cancel.is_cancelled() {
            return Err(GatherError::Cancelled);
        }

        let frontier = referenced_ids(&candidates);
        let pairs: Vec<(&NamedSource, String)> = sources
            .iter()
            .flat_map(|named| {
                ledger
                    .unqueried(&named.name, &frontier)
                    .into_iter()
                    .map(|id| (named, id.to_string()))
                    .collect::<Vec<_>>()
            })
            .collect();

        if pairs.is_empty() {
            break;
        }

        stats.passes.fetch_add(1, Ordering::Relaxed);
        debug!(pass = stats.snapshot().passes, pairs = pairs.len(), "dispatching fixed-point pass");

        let pass = stream::iter(pairs)
            .map(|(named, id)| expand_one(named, id, target, context, &candidates, &ledger, &stats, cancel))
            .buffer_unordered(context.max_parallelism)
            .collect::<Vec<()>>();

        // Same race as the seed pass: a blocking query on any (source, id)
        // pair must not prevent the rest of this pass's in-flight work from
        // being abandoned once `cancel` fires.
        tokio::select! {
            _ = pass => {}
            _ = cancel.cancelled() => return Err(GatherError::Cancelled),
        }
    }

    if cancel.is_cancelled() {
        return Err(GatherError::Cancelled);
    }

    Ok((candidates, ledger))
}

async fn seed_pass(
    root: &[Identity],
    target: &Profile,
    sources: &[NamedSource],
    context: &GatherContext,
    candidates: &CandidateSet,
    ledger: &QueriedLedger,
    stats: &GatherStats,
    cancel: &CancellationToken,
) {
    stream::iter(sources.iter())
        .map(|named| seed_one(named, root, target, context, candidates, ledger, stats, cancel))
        .buffer_unordered(context.max_parallelism)
        .collect::<Vec<()>>()
        .await;
}

async fn seed_one(
    named: &NamedSource,
    root: &[Identity],
    target: &Profile,
    context: &GatherContext,
    candidates: &CandidateSet,
    ledger: &QueriedLedger,
    stats: &GatherStats,
    cancel: &CancellationToken,
) {
    if cancel.is_cancelled() {
        return;
    }

    // Step a: pre-mark the root id(s) queried for this source before the
    // call happens, so a transport failure still counts as queried and is
    // never retried within this gather.
    for identity in root {
        ledger.mark_queried(&named.name, identity.id());
    }

    stats.queries_dispatched.fetch_add(1, Ordering::Relaxed);
    match named
        .capability
        .resolve_by_identity(root, target, context.include_prerelease)
        .await
    {
        Ok(records) => {
            for record in records {
                insert_record(named, record, candidates, stats);
            }
        }
        Err(err) => {
            stats.queries_failed.fetch_add(1, Ordering::Relaxed);
            warn!(source = %named.name, error = %err, "seed query failed");
        }
    }
}

async fn expand_one(
    named: &NamedSource,
    id: String,
    target: &Profile,
    context: &GatherContext,
    candidates: &CandidateSet,
    ledger: &QueriedLedger,
    stats: &GatherStats,
    cancel: &CancellationToken,
) {
    if cancel.is_cancelled() {
        return;
    }

    stats.queries_dispatched.fetch_add(1, Ordering::Relaxed);
    let result = named
        .capability
        .resolve_by_id(&id, target, context.include_prerelease, cancel)
        .await;

    // Record as queried regardless of outcome: per-source failures are
    // logged and non-fatal, and are never retried within this gather.
    ledger.mark_queried(&named.name, &id);

    match result {
        Ok(records) => {
            for record in records {
                insert_record(named, record, candidates, stats);
            }
        }
        Err(err) => {
            stats.queries_failed.fetch_add(1, Ordering::Relaxed);
            warn!(source = %named.name, id = %id, error = %err, "query failed");
        }
    }
}

fn insert_record(named: &NamedSource, record: Record, candidates: &CandidateSet, stats: &GatherStats) {
    let tagged = SourceTaggedRecord::new(record, named.name.clone());
    if candidates.insert(tagged) {
        stats.records_discovered.fetch_add(1, Ordering::Relaxed);
    }
}

/// The distinct, lowercased ids referenced as dependencies by every record
/// discovered so far — the frontier the next fixed-point pass must cover.
fn referenced_ids(candidates: &CandidateSet) -> Vec<String> {
    let mut ids: Vec<String> = candidates
        .snapshot()
        .iter()
        .flat_map(|tagged| tagged.record().dependencies().iter().map(|d| d.id().to_lowercase()))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use gather_core::{Dependency, Version};
    use gather_source::InMemorySource;
    use pretty_assertions::assert_eq;

    fn identity(id: &str, version: u64) -> Identity {
        Identity::new(id, Version::new(version, 0, 0, 0))
    }

    fn named(name: &str, source: InMemorySource) -> NamedSource {
        NamedSource::new(SourceRef::new(name), Arc::new(source))
    }

    fn profile() -> Profile {
        Profile::new("net8.0")
    }

    // S1: a dependency appearing identically in two sources yields two
    // distinct SourceTaggedRecords, never collapsed into one.
    #[tokio::test]
    async fn duplicate_across_sources_is_not_collapsed() {
        // S3: both sources host the root identity directly, so each is
        // queried for it independently in the seed pass — the
        // resolve-by-identity "covering" optimization only suppresses a
        // later resolve_by_id for ids a source has already answered about,
        // never the seed query itself.
        let a = InMemorySource::new();
        a.add(Record::new(identity("root/pkg", 1), true, vec![]));

        let b = InMemorySource::new();
        b.add(Record::new(identity("root/pkg", 1), true, vec![]));

        let sources = vec![named("a", a), named("b", b)];
        let root = vec![identity("root/pkg", 1)];
        let result = gather(&root, &profile(), &sources, &GatherContext::default(), &CancellationToken::new())
            .await
            .unwrap();

        let shared: Vec<_> = result
            .iter()
            .filter(|r| r.record().identity().id_key() == "root/pkg")
            .collect();
        assert_eq!(shared.len(), 2);
    }

    // S2: two sources each host disjoint halves of a dependency chain; the
    // returned set contains every record, each tagged with the source that
    // actually hosts it, and C (never referenced) is excluded.
    #[tokio::test]
    async fn split_across_sources_covers_full_chain() {
        let x = InMemorySource::new();
        x.add(Record::new(identity("pkg/a", 1), true, vec![Dependency::new("pkg/b", "*")]));
        x.add(Record::new(identity("pkg/c", 1), true, vec![]));

        let y = InMemorySource::new();
        y.add(Record::new(identity("pkg/b", 1), true, vec![Dependency::new("pkg/d", "*")]));
        y.add(Record::new(identity("pkg/d", 1), true, vec![]));

        let sources = vec![named("x", x), named("y", y)];
        let root = vec![identity("pkg/a", 1)];
        let result = gather(&root, &profile(), &sources, &GatherContext::default(), &CancellationToken::new())
            .await
            .unwrap();

        let mut tagged: Vec<(String, String)> = result
            .iter()
            .map(|r| (r.record().identity().id_key(), r.source().as_str().to_string()))
            .collect();
        tagged.sort_unstable();
        assert_eq!(
            tagged,
            vec![
                ("pkg/a".to_string(), "x".to_string()),
                ("pkg/b".to_string(), "y".to_string()),
                ("pkg/d".to_string(), "y".to_string()),
            ]
        );
    }

    // S1: a single source hosting a simple two-node chain.
    #[tokio::test]
    async fn single_source_simple_chain() {
        let x = InMemorySource::new();
        x.add(Record::new(identity("pkg/a", 1), true, vec![Dependency::new("pkg/b", "*")]));
        x.add(Record::new(identity("pkg/b", 1), true, vec![]));

        let sources = vec![named("x", x)];
        let root = vec![identity("pkg/a", 1)];
        let result = gather(&root, &profile(), &sources, &GatherContext::default(), &CancellationToken::new())
            .await
            .unwrap();

        let mut ids: Vec<_> = result.iter().map(|r| r.record().identity().id_key()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["pkg/a", "pkg/b"]);
        assert!(result.iter().all(|r| r.source().as_str() == "x"));
    }

    // S2: a cyclic dependency graph still terminates.
    #[tokio::test]
    async fn cyclic_dependencies_terminate() {
        let a = InMemorySource::new();
        a.add(Record::new(identity("pkg/a", 1), true, vec![Dependency::new("pkg/b", "*")]));
        a.add(Record::new(identity("pkg/b", 1), true, vec![Dependency::new("pkg/a", "*")]));

        let sources = vec![named("a", a)];
        let root = vec![identity("pkg/a", 1)];
        let result = gather(&root, &profile(), &sources, &GatherContext::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }

    // S3: a failing source does not prevent other sources from contributing.
    #[tokio::test]
    async fn failing_source_does_not_abort_gather() {
        struct AlwaysFails;

        #[async_trait::async_trait]
        impl SourceQueryCapability for AlwaysFails {
            async fn resolve_by_identity(
                &self,
                _identities: &[Identity],
                _profile: &Profile,
                _include_prerelease: bool,
            ) -> Result<Vec<Record>, gather_core::SourceError> {
                Err(gather_core::SourceError::Unavailable {
                    source: SourceRef::new("broken"),
                    message: "down".to_string(),
                })
            }

            async fn resolve_by_id(
                &self,
                _id: &str,
                _profile: &Profile,
                _include_prerelease: bool,
                _cancel: &CancellationToken,
            ) -> Result<Vec<Record>, gather_core::SourceError> {
                Err(gather_core::SourceError::Unavailable {
                    source: SourceRef::new("broken"),
                    message: "down".to_string(),
                })
            }
        }

        let good = InMemorySource::new();
        good.add(Record::new(identity("root/pkg", 1), true, vec![]));

        let sources = vec![
            NamedSource::new(SourceRef::new("broken"), Arc::new(AlwaysFails)),
            named("good", good),
        ];
        let root = vec![identity("root/pkg", 1)];
        let result = gather(&root, &profile(), &sources, &GatherContext::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
    }

    // Drives the real HttpSource adapter (not just InMemorySource) through
    // the driver against a wiremock-backed fake registry, proving the
    // fixed-point loop discovers a chain over HTTP the same way it does
    // over the in-memory fixture used elsewhere in this module.
    #[tokio::test]
    async fn http_source_discovers_chain_through_driver() {
        use gather_source::HttpSource;
        use gather_test_utils::FakeRegistry;
        use url::Url;

        let registry = FakeRegistry::start().await;
        registry
            .add(
                &identity("pkg/a", 1),
                &[("net8.0", &[("pkg/b", "*")])],
            )
            .await;
        registry.add(&identity("pkg/b", 1), &[("net8.0", &[])]).await;

        let base = Url::parse(&registry.base_url()).unwrap();
        let http = HttpSource::new("registry", base).unwrap();
        let sources = vec![NamedSource::new(SourceRef::new("registry"), Arc::new(http))];
        let root = vec![identity("pkg/a", 1)];

        let result = gather(&root, &profile(), &sources, &GatherContext::default(), &CancellationToken::new())
            .await
            .unwrap();

        let mut ids: Vec<_> = result.iter().map(|r| r.record().identity().id_key()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["pkg/a", "pkg/b"]);
    }

    // S4: no sources implement the capability -> NoSourcesAvailable.
    #[tokio::test]
    async fn no_sources_is_an_error() {
        let root = vec![identity("root/pkg", 1)];
        let err = gather(&root, &profile(), &[], &GatherContext::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GatherError::NoSourcesAvailable));
    }

    // Cancellation edge case ahead of S6 below: a token already cancelled
    // before the call fails fast, without entering the seed pass at all.
    #[tokio::test]
    async fn cancellation_before_seed_pass_is_fatal() {
        let a = InMemorySource::new();
        a.add(Record::new(identity("root/pkg", 1), true, vec![]));

        let cancel = CancellationToken::new();
        cancel.cancel();

        let sources = vec![named("a", a)];
        let root = vec![identity("root/pkg", 1)];
        let err = gather(&root, &profile(), &sources, &GatherContext::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, GatherError::Cancelled));
    }

    // S6: a source deliberately blocks inside resolve_by_identity;
    // cancellation is signaled mid-seed-pass. gather must abandon the
    // in-flight query and return Cancelled promptly rather than hang.
    #[tokio::test]
    async fn cancellation_during_blocking_seed_query_aborts_promptly() {
        struct BlocksForever;

        #[async_trait::async_trait]
        impl SourceQueryCapability for BlocksForever {
            async fn resolve_by_identity(
                &self,
                _identities: &[Identity],
                _profile: &Profile,
                _include_prerelease: bool,
            ) -> Result<Vec<Record>, gather_core::SourceError> {
                std::future::pending().await
            }

            async fn resolve_by_id(
                &self,
                _id: &str,
                _profile: &Profile,
                _include_prerelease: bool,
                _cancel: &CancellationToken,
            ) -> Result<Vec<Record>, gather_core::SourceError> {
                std::future::pending().await
            }
        }

        let sources = vec![NamedSource::new(SourceRef::new("blocking"), Arc::new(BlocksForever))];
        let root = vec![identity("root/pkg", 1)];
        let cancel = CancellationToken::new();

        let gather_fut = gather(&root, &profile(), &sources, &GatherContext::default(), &cancel);
        let canceller = async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            cancel.cancel();
        };

        let (result, ()) = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            futures_util::future::join(gather_fut, canceller),
        )
        .await
        .expect("gather did not abandon the blocked seed query after cancellation fired");

        assert!(matches!(result, Err(GatherError::Cancelled)));
    }

    // S6: max_parallelism = 1 is deterministic in content (not ordering):
    // the same set of records is discovered as with higher parallelism.
    #[tokio::test]
    async fn serialized_gather_discovers_same_set() {
        let a = InMemorySource::new();
        a.add(Record::new(identity("root/pkg", 1), true, vec![Dependency::new("dep/one", "*"), Dependency::new("dep/two", "*")]));
        a.add(Record::new(identity("dep/one", 1), true, vec![]));
        a.add(Record::new(identity("dep/two", 1), true, vec![]));

        let sources = vec![named("a", a)];
        let root = vec![identity("root/pkg", 1)];
        let context = GatherContext {
            max_parallelism: 1,
            include_prerelease: false,
        };
        let result = gather(&root, &profile(), &sources, &context, &CancellationToken::new())
            .await
            .unwrap();

        let mut ids: Vec<_> = result.iter().map(|r| r.record().identity().id_key()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["dep/one", "dep/two", "root/pkg"]);
    }

    // Documents the Open Question's divergence risk: pre-marking a root
    // id as queried for the returning source means a narrower
    // resolve_by_identity closure is never reconciled against a broader
    // resolve_by_id closure from the same source.
    #[tokio::test]
    async fn pre_marking_can_diverge_from_resolve_by_id_closure() {
        struct MixedProtocolSource;

        #[async_trait::async_trait]
        impl SourceQueryCapability for MixedProtocolSource {
            async fn resolve_by_identity(
                &self,
                identities: &[Identity],
                _profile: &Profile,
                _include_prerelease: bool,
            ) -> Result<Vec<Record>, gather_core::SourceError> {
                // Narrower: claims no dependencies.
                Ok(identities.iter().map(|i| Record::new(i.clone(), true, vec![])).collect())
            }

            async fn resolve_by_id(
                &self,
                id: &str,
                _profile: &Profile,
                _include_prerelease: bool,
                _cancel: &CancellationToken,
            ) -> Result<Vec<Record>, gather_core::SourceError> {
                // Broader: the same id actually has a dependency when
                // queried the other way.
                Ok(vec![Record::new(
                    identity(id, 1),
                    true,
                    vec![Dependency::new("hidden/dep", "*")],
                )])
            }
        }

        let sources = vec![NamedSource::new(
            SourceRef::new("mixed"),
            Arc::new(MixedProtocolSource),
        )];
        let root = vec![identity("root/pkg", 1)];
        let result = gather(&root, &profile(), &sources, &GatherContext::default(), &CancellationToken::new())
            .await
            .unwrap();

        // "hidden/dep" is never discovered: the pre-marked root id is
        // skipped in the fixed-point loop, so resolve_by_id("root/pkg") is
        // never called on this source to surface it.
        assert!(result.iter().all(|r| r.record().identity().id_key() != "hidden/dep"));
    }

    mod invariants {
        //! Property tests for spec.md §8's six invariants, run over small
        //! randomly generated dependency graphs partitioned across two
        //! sources (cycles allowed, matching S4's "cycles are not an
        //! error" requirement).
        use super::*;
        use proptest::prelude::*;

        /// Build two [`InMemorySource`]s from a small directed graph: node
        /// `i` is named `pkg/n{i}`, lives on `homes[i]` (`false` = source
        /// a, `true` = source b), and declares a dependency on every node
        /// `j` reachable via an edge `(i, j)` — regardless of which source
        /// hosts `j`, modeling the federated-metadata scenario this
        /// subsystem exists for.
        fn build_sources(n: usize, edges: &[(usize, usize)], homes: &[bool]) -> (InMemorySource, InMemorySource) {
            let name = |i: usize| format!("pkg/n{i}");
            let a = InMemorySource::new();
            let b = InMemorySource::new();
            for i in 0..n {
                let deps: Vec<Dependency> = edges
                    .iter()
                    .filter(|(from, _)| *from == i)
                    .map(|(_, to)| Dependency::new(name(*to), "*"))
                    .collect();
                let record = Record::new(identity(&name(i), 1), true, deps);
                if homes[i] {
                    b.add(record);
                } else {
                    a.add(record);
                }
            }
            (a, b)
        }

        fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>, Vec<bool>)> {
            (2usize..=5).prop_flat_map(|n| {
                (
                    Just(n),
                    prop::collection::vec((0..n, 0..n), 0..6),
                    prop::collection::vec(any::<bool>(), n),
                )
            })
        }

        fn run_gather_sync(
            a: InMemorySource,
            b: InMemorySource,
            root: Identity,
            max_parallelism: usize,
        ) -> (Vec<SourceTaggedRecord>, QueriedLedger) {
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            rt.block_on(async {
                let sources = vec![named("a", a), named("b", b)];
                let context = GatherContext {
                    max_parallelism,
                    include_prerelease: false,
                };
                let (candidates, ledger) =
                    run(&[root], &profile(), &sources, &context, &CancellationToken::new())
                        .await
                        .unwrap();
                (candidates.snapshot(), ledger)
            })
        }

        proptest! {
            /// Invariant 2 (Coverage): every dependency id declared by a
            /// discovered record was queried against at least one source.
            #[test]
            fn coverage((n, edges, homes) in graph_strategy()) {
                let (a, b) = build_sources(n, &edges, &homes);
                let root = identity("pkg/n0", 1);
                let (records, ledger) = run_gather_sync(a, b, root, 4);

                for record in &records {
                    for dep in record.record().dependencies() {
                        let covered = ["a", "b"].iter().any(|s| ledger.is_queried(&SourceRef::new(*s), dep.id()));
                        prop_assert!(covered, "dependency {} never queried anywhere", dep.id());
                    }
                }
            }

            /// Invariant 3 (No duplicate tagged records): the (id, version,
            /// source) triple is unique across the returned set.
            #[test]
            fn no_duplicate_tagged_records((n, edges, homes) in graph_strategy()) {
                let (a, b) = build_sources(n, &edges, &homes);
                let root = identity("pkg/n0", 1);
                let (records, _ledger) = run_gather_sync(a, b, root, 4);

                let mut seen = std::collections::HashSet::new();
                for record in &records {
                    let key = (record.record().identity().id_key(), record.record().identity().version().to_string(), record.source().as_str().to_string());
                    prop_assert!(seen.insert(key), "duplicate tagged record in output");
                }
            }

            /// Invariant 4 (Source idempotence): running gather twice with
            /// identical fake sources yields equal sets.
            #[test]
            fn source_idempotence((n, edges, homes) in graph_strategy()) {
                let (a1, b1) = build_sources(n, &edges, &homes);
                let root = identity("pkg/n0", 1);
                let (mut first, _) = run_gather_sync(a1, b1, root.clone(), 4);

                let (a2, b2) = build_sources(n, &edges, &homes);
                let (mut second, _) = run_gather_sync(a2, b2, root, 4);

                let key = |r: &SourceTaggedRecord| (r.record().identity().id_key(), r.record().identity().version().to_string(), r.source().as_str().to_string());
                first.sort_by_key(key);
                second.sort_by_key(key);
                prop_assert_eq!(first.len(), second.len());
                for (x, y) in first.iter().zip(second.iter()) {
                    prop_assert_eq!(key(x), key(y));
                }
            }

            /// Invariant 6 (Deterministic under serialization): pinning
            /// `max_parallelism = 1` and running twice yields the same set
            /// under any stable ordering.
            #[test]
            fn deterministic_under_max_parallelism_one((n, edges, homes) in graph_strategy()) {
                let (a1, b1) = build_sources(n, &edges, &homes);
                let root = identity("pkg/n0", 1);
                let (mut first, _) = run_gather_sync(a1, b1, root.clone(), 1);

                let (a2, b2) = build_sources(n, &edges, &homes);
                let (mut second, _) = run_gather_sync(a2, b2, root, 1);

                let key = |r: &SourceTaggedRecord| (r.record().identity().id_key(), r.record().identity().version().to_string(), r.source().as_str().to_string());
                first.sort_by_key(key);
                second.sort_by_key(key);
                let firsts: Vec<_> = first.iter().map(key).collect();
                let seconds: Vec<_> = second.iter().map(key).collect();
                prop_assert_eq!(firsts, seconds);
            }

            /// Invariant 1 (Monotonicity) as a termination check: the loop
            /// only stops once every source has no unqueried id left in the
            /// final frontier — i.e. the fixed point is a true fixed point,
            /// not an early exit. The ledger API has no removal operation,
            /// so "never shrinks" is a static guarantee; what's worth
            /// checking is that growth actually reached completion.
            #[test]
            fn every_referenced_id_is_queried_at_every_source_on_completion((n, edges, homes) in graph_strategy()) {
                let (a, b) = build_sources(n, &edges, &homes);
                let root = identity("pkg/n0", 1);
                let (records, ledger) = run_gather_sync(a, b, root, 4);

                let referenced: std::collections::HashSet<String> = records
                    .iter()
                    .flat_map(|r| r.record().dependencies().iter().map(|d| d.id().to_lowercase()))
                    .collect();

                for id in &referenced {
                    prop_assert!(ledger.is_queried(&SourceRef::new("a"), id));
                    prop_assert!(ledger.is_queried(&SourceRef::new("b"), id));
                }
            }
        }

        // Invariant 5 (Cross-source fixed point) is covered directly by
        // the concrete S2 scenario (`split_across_sources_covers_full_chain`
        // above): two sources each hosting disjoint halves of a chain, with
        // the returned set containing every node tagged by its true host.
    }
}
