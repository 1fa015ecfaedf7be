use crate::media::MediaCandidate;
use crate::storage::{MediaRecord, MediaStore};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// A per-name persistence failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaError {
    pub name: String,
    pub video_url: String,
    pub message: String,
}

/// Outcome of persisting one batch of candidates
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpsertReport {
    /// Records the store accepted, in first-seen name order
    pub saved: Vec<MediaRecord>,
    /// Names the store rejected
    pub errors: Vec<MediaError>,
    /// Candidates dropped before deduplication for a blank name or bad URL
    pub malformed: usize,
}

/// Deduplicates candidates and writes them through a media store
#[derive(Clone)]
pub struct UpsertCoordinator {
    store: Arc<dyn MediaStore>,
}

impl UpsertCoordinator {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self { store }
    }

    /// Persists a batch of candidates
    ///
    /// Malformed candidates are counted and dropped. The rest are
    /// deduplicated by name keeping the last one seen, then upserted once
    /// per name. A failing name is recorded and does not stop the others.
    pub fn persist<I>(&self, candidates: I) -> UpsertReport
    where
        I: IntoIterator<Item = MediaCandidate>,
    {
        let (unique, malformed) = dedup_last_wins(candidates);
        let mut report = UpsertReport {
            malformed,
            ..UpsertReport::default()
        };

        if malformed > 0 {
            tracing::debug!("Dropped {} malformed media candidates", malformed);
        }

        for candidate in unique {
            match self.store.upsert(&candidate.name, &candidate.video_url) {
                Ok(record) => {
                    tracing::debug!("Saved media '{}' -> {}", record.name, record.video_url);
                    report.saved.push(record);
                }
                Err(e) => {
                    tracing::warn!("Failed to save media '{}': {}", candidate.name, e);
                    report.errors.push(MediaError {
                        name: candidate.name,
                        video_url: candidate.video_url,
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

/// Validates candidates and keeps the last one seen for each name
///
/// The position of a name is the position of its first occurrence. Returns
/// the surviving candidates and the number of malformed ones.
fn dedup_last_wins<I>(candidates: I) -> (Vec<MediaCandidate>, usize)
where
    I: IntoIterator<Item = MediaCandidate>,
{
    let mut unique: Vec<MediaCandidate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut malformed = 0;

    for candidate in candidates {
        let Some(candidate) = candidate.validated() else {
            malformed += 1;
            continue;
        };

        match index.get(&candidate.name) {
            Some(&i) => unique[i] = candidate,
            None => {
                index.insert(candidate.name.clone(), unique.len());
                unique.push(candidate);
            }
        }
    }

    (unique, malformed)
}
