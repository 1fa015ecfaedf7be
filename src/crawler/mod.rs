//! Crawler module for bounded exercise-media crawls
//!
//! This module contains the core crawling logic, including:
//! - The breadth-first frontier with its per-job visited set
//! - HTTP fetching with pacing and timeouts
//! - Extraction of (name, video URL) pairs and outbound links
//! - The job loop that ties them together under a page budget

mod extractor;
mod fetcher;
mod frontier;
mod job;

pub use extractor::{extract, is_video_url, ExtractedPage};
pub use fetcher::{build_http_client, fetch_url, FetchOutcome, FetchedPage, Fetcher};
pub use frontier::{Admission, Frontier, FrontierEntry, VisitedSet};
pub use job::{CrawlJob, CrawlSummary, JobState, PageFailure};

use crate::config::{CrawlConfig, UserAgentConfig};
use crate::media::UpsertCoordinator;
use crate::storage::MediaStore;
use std::sync::Arc;
use std::time::Duration;

/// Runs a complete crawl job against `store`
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client with the configured user agent
/// 2. Fetch pages breadth-first from the seeds within the budget
/// 3. Extract media candidates and follow links
/// 4. Upsert the deduplicated candidates
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Job reached a terminal state
/// * `Err(reqwest::Error)` - The HTTP client could not be built
pub async fn crawl(
    config: CrawlConfig,
    user_agent: &UserAgentConfig,
    fetch_timeout: Duration,
    store: Arc<dyn MediaStore>,
) -> Result<CrawlSummary, reqwest::Error> {
    let client = build_http_client(user_agent, fetch_timeout)?;
    let fetcher = Fetcher::new(client, config.delay, fetch_timeout);
    let job = CrawlJob::new(config, fetcher, UpsertCoordinator::new(store));
    Ok(job.run().await)
}
