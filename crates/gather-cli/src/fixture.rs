//! Offline JSON fixture loading for [`gather_source::InMemorySource`].
//!
//! A fixture file is a JSON object mapping source name to the list of
//! records that source hosts:
//!
//! ```json
//! {
//!   "local": [
//!     {
//!       "id": "some.package",
//!       "version": "1.2.0.0",
//!       "listed": true,
//!       "dependencies": [
//!         { "id": "some.other.package", "range": "1.0.0" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! This is intentionally a simpler shape than [`Record`]'s own derived
//! `Deserialize` impl (version and range as plain strings rather than the
//! structured forms), since the fixture is meant to be hand-written.

use anyhow::Context;
use gather_core::{Dependency, Record, SourceRef, Version};
use gather_driver::NamedSource;
use gather_source::InMemorySource;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct FixtureDependency {
    id: String,
    range: String,
}

#[derive(Debug, Deserialize)]
struct FixtureRecord {
    id: String,
    version: String,
    #[serde(default = "default_listed")]
    listed: bool,
    #[serde(default)]
    dependencies: Vec<FixtureDependency>,
}

fn default_listed() -> bool {
    true
}

/// Load a fixture file into one [`NamedSource`] per top-level key.
pub fn load(path: &Path) -> anyhow::Result<Vec<NamedSource>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading fixture file {}", path.display()))?;
    let document: HashMap<String, Vec<FixtureRecord>> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing fixture file {} as JSON", path.display()))?;

    let mut sources = Vec::with_capacity(document.len());
    for (name, records) in document {
        let source = InMemorySource::new();
        for fixture_record in records {
            let version = Version::parse(&fixture_record.version)
                .with_context(|| format!("package {} has invalid version", fixture_record.id))?;
            let dependencies = fixture_record
                .dependencies
                .into_iter()
                .map(|d| Dependency::new(d.id, d.range.as_str()))
                .collect();
            let identity = gather_core::Identity::new(fixture_record.id, version);
            source.add(Record::new(identity, fixture_record.listed, dependencies));
        }
        sources.push(NamedSource::new(SourceRef::new(name), Arc::new(source)));
    }
    Ok(sources)
}
