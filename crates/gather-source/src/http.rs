//! An HTTP-backed [`SourceQueryCapability`] against a flat per-id JSON
//! metadata document, with retry, per-host rate limiting, and ETag-based
//! conditional requests.

use crate::capability::SourceQueryCapability;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use dashmap::DashMap;
use gather_core::{Dependency, DependencyGroup, Identity, Profile, Record, SourceError, SourceRef, Version, VersionRange};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Configuration for an [`HttpSource`].
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_retries: usize,
    pub retry_delay: Duration,
    pub max_retry_delay: Duration,
    pub rate_limit_per_host: u32,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_delay: Duration::from_millis(100),
            max_retry_delay: Duration::from_secs(10),
            rate_limit_per_host: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct WireDocument {
    versions: Vec<WireVersion>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireVersion {
    version: String,
    #[serde(default = "default_true")]
    listed: bool,
    #[serde(default)]
    dependency_groups: Vec<WireDependencyGroup>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
struct WireDependencyGroup {
    profile: String,
    #[serde(default)]
    dependencies: Vec<WireDependency>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireDependency {
    id: String,
    range: String,
}

type HostRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Debug, Clone)]
struct CacheEntry {
    etag: Option<String>,
    body: Arc<str>,
}

/// A repository reached over HTTP, one JSON document per package id.
#[derive(Debug)]
pub struct HttpSource {
    name: SourceRef,
    base_url: Url,
    client: Client,
    config: HttpSourceConfig,
    rate_limiters: DashMap<String, Arc<HostRateLimiter>>,
    cache: DashMap<String, CacheEntry>,
}

impl HttpSource {
    /// # Errors
    /// Returns an error if the underlying reqwest client cannot be built.
    pub fn new(name: impl Into<Arc<str>>, base_url: Url) -> reqwest::Result<Self> {
        Self::with_config(name, base_url, HttpSourceConfig::default())
    }

    /// # Errors
    /// Returns an error if the underlying reqwest client cannot be built.
    pub fn with_config(
        name: impl Into<Arc<str>>,
        base_url: Url,
        config: HttpSourceConfig,
    ) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(format!("gather-source/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            name: SourceRef::new(name),
            base_url,
            client,
            config,
            rate_limiters: DashMap::new(),
            cache: DashMap::new(),
        })
    }

    fn rate_limiter(&self, host: &str) -> Arc<HostRateLimiter> {
        self.rate_limiters
            .entry(host.to_string())
            .or_insert_with(|| {
                let quota =
                    Quota::per_second(NonZeroU32::new(self.config.rate_limit_per_host).unwrap_or(NonZeroU32::MIN));
                Arc::new(RateLimiter::direct(quota))
            })
            .clone()
    }

    async fn fetch_document(&self, id: &str) -> Result<WireDocument, SourceError> {
        let url = self
            .base_url
            .join(&format!("{}.json", id.to_lowercase()))
            .map_err(|e| SourceError::Malformed {
                source: self.name.clone(),
                id: id.to_string(),
                message: format!("invalid metadata url: {e}"),
            })?;

        let host = url.host_str().unwrap_or_default().to_string();
        let limiter = self.rate_limiter(&host);
        limiter.until_ready().await;

        let cache_key = url.to_string();
        let cached_etag = self.cache.get(&cache_key).and_then(|e| e.etag.clone());

        let config = &self.config;
        let body = (|| async {
            let mut request = self.client.get(url.clone());
            if let Some(etag) = &cached_etag {
                request = request.header(header::IF_NONE_MATCH, etag.as_str());
            }

            let start = Instant::now();
            let response = request.send().await.map_err(|e| classify_reqwest_error(&self.name, id, &e))?;
            debug!(elapsed = ?start.elapsed(), %id, source = %self.name, "fetched metadata");

            let status = response.status();
            if status == StatusCode::NOT_MODIFIED {
                let cached = self
                    .cache
                    .get(&cache_key)
                    .ok_or_else(|| SourceError::Unavailable {
                        source: self.name.clone(),
                        message: "304 with no cached body".to_string(),
                    })?;
                return Ok(cached.body.clone());
            }

            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                return Err(SourceError::Unavailable {
                    source: self.name.clone(),
                    message: format!("status {status}"),
                });
            }
            if !status.is_success() {
                return Err(SourceError::Malformed {
                    source: self.name.clone(),
                    id: id.to_string(),
                    message: format!("unexpected status {status}"),
                });
            }

            let etag = response
                .headers()
                .get(header::ETAG)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            let text = response.text().await.map_err(|e| classify_reqwest_error(&self.name, id, &e))?;
            let body: Arc<str> = Arc::from(text);
            self.cache.insert(
                cache_key.clone(),
                CacheEntry {
                    etag,
                    body: body.clone(),
                },
            );
            Ok(body)
        })
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(config.retry_delay)
                .with_max_delay(config.max_retry_delay)
                .with_max_times(config.max_retries),
        )
        .when(|e| matches!(e, SourceError::Unavailable { .. }))
        .notify(|err, dur| warn!(error = %err, retry_in = ?dur, "retrying source request"))
        .await?;

        serde_json::from_str(&body).map_err(|e| SourceError::Malformed {
            source: self.name.clone(),
            id: id.to_string(),
            message: format!("invalid metadata document: {e}"),
        })
    }
}

fn classify_reqwest_error(source: &SourceRef, id: &str, error: &reqwest::Error) -> SourceError {
    if error.is_timeout() || error.is_connect() {
        SourceError::Unavailable {
            source: source.clone(),
            message: error.to_string(),
        }
    } else {
        SourceError::Malformed {
            source: source.clone(),
            id: id.to_string(),
            message: error.to_string(),
        }
    }
}

fn to_records(id: &str, doc: WireDocument, profile: &Profile) -> Vec<Record> {
    doc.versions
        .into_iter()
        .filter_map(|v| {
            let version = Version::parse(&v.version).ok()?;
            let groups: Vec<DependencyGroup> = v
                .dependency_groups
                .into_iter()
                .map(|g| {
                    let deps = g
                        .dependencies
                        .into_iter()
                        .map(|d| Dependency::new(d.id, VersionRange::new(d.range)))
                        .collect();
                    DependencyGroup::new(Profile::new(g.profile), deps)
                })
                .collect();
            let narrowed = DependencyGroup::narrow(&groups, profile)
                .map(|g| g.dependencies().to_vec())
                .unwrap_or_default();
            Some(Record::new(Identity::new(id, version), v.listed, narrowed))
        })
        .collect()
}

#[async_trait]
impl SourceQueryCapability for HttpSource {
    async fn resolve_by_identity(
        &self,
        identities: &[Identity],
        profile: &Profile,
        include_prerelease: bool,
    ) -> Result<Vec<Record>, SourceError> {
        let mut out = Vec::new();
        for identity in identities {
            let doc = self.fetch_document(identity.id()).await?;
            let records = to_records(identity.id(), doc, profile);
            out.extend(
                records
                    .into_iter()
                    .filter(|r| r.identity() == identity)
                    .filter(|r| include_prerelease || !r.identity().version().is_prerelease()),
            );
        }
        Ok(out)
    }

    async fn resolve_by_id(
        &self,
        id: &str,
        profile: &Profile,
        include_prerelease: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<Record>, SourceError> {
        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }
        let doc = self.fetch_document(id).await?;
        Ok(to_records(id, doc, profile)
            .into_iter()
            .filter(|r| include_prerelease || !r.identity().version().is_prerelease())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn resolve_by_id_parses_wire_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/foo/bar.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "versions": [
                    {
                        "version": "1.0.0.0",
                        "listed": true,
                        "dependency_groups": [
                            {"profile": "netstandard2.0", "dependencies": [{"id": "baz/qux", "range": "^1.0"}]}
                        ]
                    }
                ]
            })))
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        let source = HttpSource::new("test-source", base).unwrap();
        let profile = Profile::new("net8.0");
        let cancel = CancellationToken::new();

        let records = source
            .resolve_by_id("foo/bar", &profile, false, &cancel)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].dependencies().len(), 1);
        assert_eq!(records[0].dependencies()[0].id(), "baz/qux");
    }

    #[tokio::test]
    async fn malformed_status_is_reported_as_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/foo/bar.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        let source = HttpSource::new("test-source", base).unwrap();
        let profile = Profile::new("net8.0");
        let cancel = CancellationToken::new();

        let err = source.resolve_by_id("foo/bar", &profile, false, &cancel).await.unwrap_err();
        assert!(matches!(err, SourceError::Malformed { .. }));
    }
}
