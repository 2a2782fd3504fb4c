//! Concurrency-safe bookkeeping for the gather driver: the candidate set of
//! discovered records and the per-source ledger of already-queried ids.

mod ledger;
mod set;

pub use ledger::QueriedLedger;
pub use set::{CandidateKey, CandidateSet};
