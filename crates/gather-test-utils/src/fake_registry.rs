//! A wiremock-backed fake registry serving the flat per-id JSON document
//! format [`gather_source::HttpSource`] expects.

use gather_core::{Dependency, DependencyGroup, Identity, Record};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A running fake registry. Register packages with [`FakeRegistry::add`]
/// before the test issues requests against [`FakeRegistry::base_url`].
pub struct FakeRegistry {
    server: MockServer,
}

impl FakeRegistry {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}/", self.server.uri())
    }

    /// Serve `identity` under its lowercased id, with one dependency group
    /// per profile.
    pub async fn add(&self, identity: &Identity, groups: &[(&str, &[(&str, &str)])]) {
        let document = document_for(identity, groups);
        Mock::given(method("GET"))
            .and(path(format!("/{}.json", identity.id().to_lowercase())))
            .respond_with(ResponseTemplate::new(200).set_body_json(document))
            .mount(&self.server)
            .await;
    }

    /// Serve an HTTP error status for `id`, simulating an unreachable or
    /// misbehaving source.
    pub async fn fail(&self, id: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/{}.json", id.to_lowercase())))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}

fn document_for(identity: &Identity, groups: &[(&str, &[(&str, &str)])]) -> Value {
    let dependency_groups: Vec<Value> = groups
        .iter()
        .map(|(profile, deps)| {
            json!({
                "profile": profile,
                "dependencies": deps.iter().map(|(id, range)| json!({"id": id, "range": range})).collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({
        "versions": [{
            "version": identity.version().to_string(),
            "listed": true,
            "dependency_groups": dependency_groups,
        }]
    })
}

/// Build a [`Record`] with a single narrowed dependency list, for fixtures
/// that don't need per-profile groups.
#[must_use]
pub fn flat_record(identity: Identity, dependencies: Vec<(&str, &str)>) -> Record {
    let deps = dependencies
        .into_iter()
        .map(|(id, range)| Dependency::new(id, range))
        .collect();
    Record::new(identity, true, deps)
}

#[must_use]
pub fn single_group(profile: &str, dependencies: Vec<(&str, &str)>) -> DependencyGroup {
    let deps = dependencies
        .into_iter()
        .map(|(id, range)| Dependency::new(id, range))
        .collect();
    DependencyGroup::new(gather_core::Profile::new(profile), deps)
}
