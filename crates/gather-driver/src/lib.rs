//! The fixed-point Gather Driver: seeds a candidate set from root identities
//! and iterates per-source queries until no pass discovers a new id.

mod fixed_point;
mod stats;

pub use fixed_point::{gather, GatherContext, NamedSource};
pub use stats::{GatherStats, StatsSnapshot};

pub use gather_core::GatherError;
