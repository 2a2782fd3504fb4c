//! The Source Query Capability abstraction and its adapters.

mod capability;
mod http;
mod memory;

pub use capability::SourceQueryCapability;
pub use http::{HttpSource, HttpSourceConfig};
pub use memory::InMemorySource;
