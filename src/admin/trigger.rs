use crate::admin::{AdminToken, AuthError};
use crate::config::{CrawlConfig, CrawlDefaults, CrawlParams};
use crate::crawler::{CrawlJob, CrawlSummary, Fetcher};
use crate::media::{MediaCandidate, UpsertCoordinator, UpsertReport};
use crate::storage::MediaStore;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// One entry of a manual correction batch
///
/// Both fields are optional on the wire; entries missing either one are
/// skipped rather than failing the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "videoUrl")]
    pub video_url: Option<String>,
}

/// Privileged entry point for ingestion
///
/// Every operation checks the presented token against the `AdminToken`
/// capability before doing any work.
#[derive(Clone)]
pub struct AdminTrigger {
    token: AdminToken,
    coordinator: UpsertCoordinator,
    client: Client,
    fetch_timeout: Duration,
    defaults: CrawlDefaults,
}

impl AdminTrigger {
    pub fn new(
        token: AdminToken,
        store: Arc<dyn MediaStore>,
        client: Client,
        fetch_timeout: Duration,
        defaults: CrawlDefaults,
    ) -> Self {
        Self {
            token,
            coordinator: UpsertCoordinator::new(store),
            client,
            fetch_timeout,
            defaults,
        }
    }

    /// Checks a presented token without doing any work
    pub fn authorize(&self, token: Option<&str>) -> Result<(), AuthError> {
        self.token.verify(token)
    }

    /// Runs one crawl job to completion and returns its summary
    ///
    /// # Errors
    ///
    /// * `IngestError::Unauthorized` - token missing or wrong; nothing is fetched
    /// * `IngestError::InvalidConfig` - parameters failed validation
    /// * `IngestError::Job` - the crawl task died before finishing
    pub async fn trigger_crawl(
        &self,
        token: Option<&str>,
        params: CrawlParams,
    ) -> crate::Result<CrawlSummary> {
        self.token.verify(token)?;

        let config = CrawlConfig::resolve(params, &self.defaults)?;
        tracing::info!("Crawl triggered for {} seeds", config.seeds.len());

        let fetcher = Fetcher::new(self.client.clone(), config.delay, self.fetch_timeout);
        let job = CrawlJob::new(config, fetcher, self.coordinator.clone());

        // A panicking job becomes IngestError::Job
        let summary = tokio::spawn(job.run()).await?;
        Ok(summary)
    }

    /// Upserts manually supplied pairs without crawling
    ///
    /// Entries missing a name or video URL are counted in `malformed`
    /// together with entries the coordinator rejects as malformed.
    pub fn bulk_upsert(
        &self,
        token: Option<&str>,
        entries: Vec<ManualEntry>,
    ) -> crate::Result<UpsertReport> {
        self.token.verify(token)?;

        let total = entries.len();
        let candidates: Vec<MediaCandidate> = entries
            .into_iter()
            .filter_map(|entry| match (entry.name, entry.video_url) {
                (Some(name), Some(video_url)) => Some(MediaCandidate::new(name, video_url, "")),
                _ => None,
            })
            .collect();
        let skipped = total - candidates.len();

        let mut report = self.coordinator.persist(candidates);
        report.malformed += skipped;

        tracing::info!(
            "Manual upsert: {} saved, {} errors, {} skipped",
            report.saved.len(),
            report.errors.len(),
            report.malformed
        );

        Ok(report)
    }
}
