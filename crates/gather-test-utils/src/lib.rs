//! Shared test fixtures for the gather subsystem: proptest strategies over
//! the core data model and a wiremock-backed fake registry for exercising
//! [`gather_source::HttpSource`] without a real network.

mod fake_registry;
mod proptest_strategies;

pub use fake_registry::{flat_record, single_group, FakeRegistry};
pub use proptest_strategies::{
    dependency_id_strategy, identity_strategy, package_id_strategy, version_strategy,
};
