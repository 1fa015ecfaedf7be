//! Exercise media candidates and their persistence
//!
//! Candidates are produced by the extractor during a crawl (or supplied
//! directly by an operator) and handed to the `UpsertCoordinator`, which
//! deduplicates them and writes them through a `MediaStore`.

mod candidate;
mod upsert;

pub use candidate::{canonical_name, MediaCandidate};
pub use upsert::{MediaError, UpsertCoordinator, UpsertReport};
