//! Crawl job orchestration
//!
//! A `CrawlJob` owns everything one bounded crawl needs. Frontier, visited
//! set and accumulated candidates live in a `JobContext` created inside
//! `run`, so concurrently running jobs share nothing but the media store.

use crate::config::{CrawlConfig, LinkPolicy};
use crate::crawler::extractor::{extract, ExtractedPage};
use crate::crawler::fetcher::{FetchOutcome, Fetcher};
use crate::crawler::frontier::{Admission, FrontierEntry, Frontier};
use crate::media::{MediaCandidate, MediaError, UpsertCoordinator};
use crate::storage::MediaRecord;
use crate::url::{normalize_url, same_host};
use serde::Serialize;
use tokio::time::{timeout_at, Instant};
use url::Url;

/// Lifecycle of a crawl job
///
/// `Pending -> Running -> {Completed, BudgetExhausted}`. Both terminal
/// states are successful outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Created, not started
    Pending,
    /// Fetch loop in progress
    Running,
    /// Frontier drained before the budget ran out
    Completed,
    /// Page budget (or wall-clock bound) reached
    BudgetExhausted,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::BudgetExhausted)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: JobState) -> bool {
        match self {
            Self::Pending => next == Self::Running,
            Self::Running => next.is_terminal(),
            Self::Completed | Self::BudgetExhausted => false,
        }
    }
}

/// A page whose fetch failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFailure {
    pub url: String,
    pub reason: String,
}

/// Result of one crawl job
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSummary {
    pub state: JobState,
    /// Fetch attempts, failures included
    pub pages_fetched: u32,
    pub pages_failed: u32,
    /// Links found on fetched pages that passed the link policy
    pub links_discovered: u64,
    pub media_saved: usize,
    pub media_errors: Vec<MediaError>,
    pub malformed_candidates: usize,
    pub fetch_failures: Vec<PageFailure>,
    pub elapsed_ms: u64,
    #[serde(skip)]
    pub saved: Vec<MediaRecord>,
}

/// Per-job mutable state, passed explicitly through every step
struct JobContext {
    frontier: Frontier,
    candidates: Vec<MediaCandidate>,
    pages_fetched: u32,
    pages_failed: u32,
    links_discovered: u64,
    failures: Vec<PageFailure>,
}

impl JobContext {
    fn new(config: &CrawlConfig) -> Self {
        let mut frontier = Frontier::new(config.max_depth);
        for seed in &config.seeds {
            frontier.enqueue(seed.clone(), 0);
        }

        Self {
            frontier,
            candidates: Vec::new(),
            pages_fetched: 0,
            pages_failed: 0,
            links_discovered: 0,
            failures: Vec::new(),
        }
    }

    fn record_failure(&mut self, url: &Url, reason: String) {
        tracing::warn!("Fetch failed for {}: {}", url, reason);
        self.pages_failed += 1;
        self.failures.push(PageFailure {
            url: url.to_string(),
            reason,
        });
    }
}

/// One bounded, breadth-first crawl
pub struct CrawlJob {
    config: CrawlConfig,
    fetcher: Fetcher,
    coordinator: UpsertCoordinator,
    state: JobState,
}

impl CrawlJob {
    pub fn new(config: CrawlConfig, fetcher: Fetcher, coordinator: UpsertCoordinator) -> Self {
        Self {
            config,
            fetcher,
            coordinator,
            state: JobState::Pending,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Runs the job to a terminal state and persists what it found
    ///
    /// The loop:
    /// 1. Stops as budget-exhausted once `max_pages` fetches were attempted
    ///    (or the wall-clock bound passed)
    /// 2. Stops as completed when the frontier is empty
    /// 3. Fetches the front entry; a failure is recorded and skipped
    /// 4. Extracts candidates and links, enqueueing links at depth + 1
    ///
    /// Candidates are upserted once, after the loop.
    pub async fn run(mut self) -> CrawlSummary {
        let started = Instant::now();
        self.transition(JobState::Running);

        tracing::info!(
            "Starting crawl: {} seeds, max depth {}, max pages {}, delay {:?}",
            self.config.seeds.len(),
            self.config.max_depth,
            self.config.max_pages,
            self.config.delay
        );

        let mut ctx = JobContext::new(&self.config);
        let deadline = self.config.max_duration.map(|limit| started + limit);

        let terminal = loop {
            if ctx.pages_fetched >= self.config.max_pages {
                tracing::info!("Page budget of {} reached", self.config.max_pages);
                break JobState::BudgetExhausted;
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                self.log_deadline();
                break JobState::BudgetExhausted;
            }

            let Some(entry) = ctx.frontier.dequeue() else {
                tracing::info!("Frontier is empty, crawl complete");
                break JobState::Completed;
            };

            if !self.process_entry(&mut ctx, entry, deadline).await {
                self.log_deadline();
                break JobState::BudgetExhausted;
            }

            if ctx.pages_fetched % 10 == 0 {
                let elapsed = started.elapsed();
                tracing::info!(
                    "Progress: {} pages fetched, {} in frontier, {} candidates, {:.2} pages/sec",
                    ctx.pages_fetched,
                    ctx.frontier.len(),
                    ctx.candidates.len(),
                    ctx.pages_fetched as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
                );
            }
        };

        self.transition(terminal);

        let report = self.coordinator.persist(std::mem::take(&mut ctx.candidates));

        let summary = CrawlSummary {
            state: self.state,
            pages_fetched: ctx.pages_fetched,
            pages_failed: ctx.pages_failed,
            links_discovered: ctx.links_discovered,
            media_saved: report.saved.len(),
            media_errors: report.errors,
            malformed_candidates: report.malformed,
            fetch_failures: ctx.failures,
            elapsed_ms: started.elapsed().as_millis() as u64,
            saved: report.saved,
        };

        tracing::info!(
            "Crawl finished ({:?}): {} pages fetched, {} failed, {} media saved, {} media errors in {}ms",
            summary.state,
            summary.pages_fetched,
            summary.pages_failed,
            summary.media_saved,
            summary.media_errors.len(),
            summary.elapsed_ms
        );

        summary
    }

    /// Fetches one entry and absorbs the result
    ///
    /// Returns false when the deadline passed during the pacing wait or the
    /// fetch itself; the entry is then not counted.
    async fn process_entry(
        &mut self,
        ctx: &mut JobContext,
        entry: FrontierEntry,
        deadline: Option<Instant>,
    ) -> bool {
        tracing::debug!("Fetching {} (depth {})", entry.url, entry.depth);

        let fetch = self.fetcher.fetch(&entry.url);
        let outcome = match deadline {
            Some(deadline) => match timeout_at(deadline, fetch).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::debug!("Deadline reached while fetching {}", entry.url);
                    return false;
                }
            },
            None => fetch.await,
        };
        ctx.pages_fetched += 1;

        match outcome {
            FetchOutcome::Success(page) => {
                let extracted = extract(&page.body, &page.final_url);
                tracing::debug!(
                    "{}: {} candidates, {} links",
                    page.final_url,
                    extracted.candidates.len(),
                    extracted.links.len()
                );
                self.absorb(ctx, &entry, extracted);
            }
            FetchOutcome::Timeout => ctx.record_failure(&entry.url, "Request timeout".to_string()),
            FetchOutcome::NetworkError { error } => ctx.record_failure(&entry.url, error),
            FetchOutcome::HttpError { status_code } => {
                ctx.record_failure(&entry.url, format!("HTTP {}", status_code))
            }
        }
        true
    }

    fn log_deadline(&self) {
        if let Some(limit) = self.config.max_duration {
            tracing::warn!("Crawl exceeded wall-clock limit of {:?}", limit);
        }
    }

    fn absorb(&self, ctx: &mut JobContext, parent: &FrontierEntry, page: ExtractedPage) {
        ctx.candidates.extend(page.candidates);

        for link in page.links {
            let normalized = match normalize_url(link.as_str()) {
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!("Failed to normalize URL {}: {}", link, e);
                    continue;
                }
            };

            if !self.link_allowed(&normalized) {
                tracing::trace!("Link {} rejected by link policy", normalized);
                continue;
            }

            ctx.links_discovered += 1;
            match ctx.frontier.enqueue(normalized, parent.depth + 1) {
                Admission::Admitted => {}
                Admission::TooDeep => {
                    tracing::trace!("Link from {} beyond max depth", parent.url)
                }
                Admission::AlreadySeen => {}
            }
        }
    }

    fn link_allowed(&self, url: &Url) -> bool {
        match self.config.link_policy {
            LinkPolicy::AnyHost => true,
            LinkPolicy::SameHost => self.config.seeds.iter().any(|seed| same_host(seed, url)),
        }
    }

    fn transition(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid job transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!("Job state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
