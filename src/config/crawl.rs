//! Per-job crawl configuration
//!
//! A `CrawlParams` value is what a caller sends; `CrawlConfig::resolve`
//! turns it into a validated, immutable `CrawlConfig` for one job.

use crate::config::types::{CrawlerConfig, LinkPolicy};
use crate::url::normalize_url;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Seeds used when neither the request nor the settings name any
pub const DEFAULT_SEEDS: &[&str] = &[
    "https://www.acefitness.org/resources/everyone/exercise-library/",
    "https://www.muscleandstrength.com/exercises",
    "https://exrx.net/Lists/Directory",
];

pub const DEFAULT_MAX_DEPTH: u32 = 2;
pub const DEFAULT_MAX_PAGES: u32 = 500;
pub const DEFAULT_DELAY_MS: u64 = 300;

/// Raw crawl parameters as supplied by a caller
///
/// Every field is optional; numbers are signed so that negative input can
/// be rejected with a descriptive error instead of a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeds: Option<Vec<String>>,

    #[serde(default, alias = "max_depth", skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<i64>,

    #[serde(default, alias = "max_pages", skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<i64>,

    #[serde(default, alias = "delay_ms", skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<i64>,
}

/// Service-level values a job falls back on
#[derive(Debug, Clone)]
pub struct CrawlDefaults {
    pub seeds: Vec<String>,
    pub link_policy: LinkPolicy,
    pub max_duration: Option<Duration>,
}

impl Default for CrawlDefaults {
    fn default() -> Self {
        Self {
            seeds: DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect(),
            link_policy: LinkPolicy::AnyHost,
            max_duration: None,
        }
    }
}

impl From<&CrawlerConfig> for CrawlDefaults {
    fn from(config: &CrawlerConfig) -> Self {
        let mut defaults = Self {
            link_policy: config.link_policy,
            max_duration: config.max_duration_secs.map(Duration::from_secs),
            ..Self::default()
        };
        if !config.default_seeds.is_empty() {
            defaults.seeds = config.default_seeds.clone();
        }
        defaults
    }
}

/// Validated configuration for a single crawl job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Normalized, deduplicated seed URLs in caller order
    pub seeds: Vec<Url>,
    /// Maximum hop distance from a seed; seeds are depth 0
    pub max_depth: u32,
    /// Maximum number of fetch attempts, failures included
    pub max_pages: u32,
    /// Minimum time between the starts of consecutive fetches
    pub delay: Duration,
    pub link_policy: LinkPolicy,
    /// Wall-clock bound; reaching it ends the job as budget-exhausted
    pub max_duration: Option<Duration>,
}

impl CrawlConfig {
    /// Resolves raw parameters into a validated configuration
    ///
    /// # Rules
    ///
    /// - Seeds are trimmed and blank entries dropped; if nothing remains the
    ///   default seeds are used
    /// - Seeds must be absolute http(s) URLs and are deduplicated after
    ///   normalization, keeping the first occurrence
    /// - `max_depth` defaults to 2, `max_pages` to 500, `delay_ms` to 300
    /// - Negative numbers and `max_pages == 0` are rejected
    pub fn resolve(params: CrawlParams, defaults: &CrawlDefaults) -> ConfigResult<Self> {
        let max_depth = to_u32(
            "maxDepth",
            non_negative("maxDepth", params.max_depth, DEFAULT_MAX_DEPTH as i64)?,
        )?;
        let max_pages = to_u32(
            "maxPages",
            non_negative("maxPages", params.max_pages, DEFAULT_MAX_PAGES as i64)?,
        )?;
        let delay_ms = non_negative("delayMs", params.delay_ms, DEFAULT_DELAY_MS as i64)?;

        if max_pages < 1 {
            return Err(ConfigError::Validation(
                "maxPages must be >= 1, got 0".to_string(),
            ));
        }

        let requested = trimmed_seeds(params.seeds.as_deref().unwrap_or_default());
        let raw_seeds = if requested.is_empty() {
            trimmed_seeds(&defaults.seeds)
        } else {
            requested
        };

        let seeds = dedup_seeds(&raw_seeds)?;
        if seeds.is_empty() {
            return Err(ConfigError::Validation(
                "at least one seed URL is required".to_string(),
            ));
        }

        Ok(Self {
            seeds,
            max_depth,
            max_pages,
            delay: Duration::from_millis(delay_ms as u64),
            link_policy: defaults.link_policy,
            max_duration: defaults.max_duration,
        })
    }
}

fn non_negative(field: &str, value: Option<i64>, default: i64) -> ConfigResult<i64> {
    match value {
        Some(v) if v < 0 => Err(ConfigError::Validation(format!(
            "{} must be >= 0, got {}",
            field, v
        ))),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

fn to_u32(field: &str, value: i64) -> ConfigResult<u32> {
    u32::try_from(value)
        .map_err(|_| ConfigError::Validation(format!("{} is too large: {}", field, value)))
}

fn trimmed_seeds(seeds: &[String]) -> Vec<&str> {
    seeds
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

fn dedup_seeds(seeds: &[&str]) -> ConfigResult<Vec<Url>> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(seeds.len());

    for seed in seeds {
        let url = normalize_url(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;
        if seen.insert(url.as_str().to_string()) {
            unique.push(url);
        }
    }

    Ok(unique)
}
