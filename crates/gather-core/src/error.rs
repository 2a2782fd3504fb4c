//! Error types shared across the gather subsystem.
//!
//! Kept deliberately flat: no error-code registry, no per-variant
//! suggestion lists. This crate has no interactive CLI surface to justify
//! that weight; `thiserror` enums with a handful of variants are enough.

use crate::record::SourceRef;
use thiserror::Error;

/// An error a single [`crate::capability`]-style source query can raise.
///
/// None of these are fatal to the overall gather: the driver logs them
/// against the source and id involved, records the id as queried, and moves
/// on without retrying.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source {source} is unavailable: {message}")]
    Unavailable { source: SourceRef, message: String },

    #[error("source {source} returned malformed data for {id}: {message}")]
    Malformed {
        source: SourceRef,
        id: String,
        message: String,
    },
}

/// The result of a full gather operation.
#[derive(Debug, Error)]
pub enum GatherError {
    #[error("gather was cancelled")]
    Cancelled,

    #[error("no configured source implements the query capability")]
    NoSourcesAvailable,
}
