//! Scheduled relay to the ingest endpoint
//!
//! The relay reads crawl parameters from the environment and forwards them,
//! with the shared admin token, to `POST /admin/ingest`. It never crawls
//! itself; range checks are left to the receiving service.

use crate::config::CrawlParams;
use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

pub const ENV_TRIGGER_URL: &str = "INGEST_TRIGGER_URL";
pub const ENV_ADMIN_TOKEN: &str = "ADMIN_TOKEN";
pub const ENV_SEEDS: &str = "CRAWL_SEEDS";
pub const ENV_MAX_DEPTH: &str = "CRAWL_MAX_DEPTH";
pub const ENV_DELAY_MS: &str = "CRAWL_DELAY_MS";
pub const ENV_MAX_PAGES: &str = "CRAWL_MAX_PAGES";
pub const ENV_INTERVAL_SECS: &str = "RELAY_INTERVAL_SECS";

/// Relay settings read from the environment
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub trigger_url: Url,
    pub token: String,
    pub params: CrawlParams,
    /// Repeat period; None sends once
    pub interval: Option<Duration>,
}

impl RelayConfig {
    /// Reads the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let trigger_url = get(ENV_TRIGGER_URL)
            .with_context(|| format!("{} must be set", ENV_TRIGGER_URL))?;
        let trigger_url = Url::parse(trigger_url.trim())
            .with_context(|| format!("{} must be a valid URL", ENV_TRIGGER_URL))?;

        let token = get(ENV_ADMIN_TOKEN)
            .with_context(|| format!("{} must be set", ENV_ADMIN_TOKEN))?
            .trim()
            .to_string();

        let seeds = get(ENV_SEEDS).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        });

        let params = CrawlParams {
            seeds: seeds.filter(|s| !s.is_empty()),
            max_depth: parse_number(ENV_MAX_DEPTH, get(ENV_MAX_DEPTH))?,
            max_pages: parse_number(ENV_MAX_PAGES, get(ENV_MAX_PAGES))?,
            delay_ms: parse_number(ENV_DELAY_MS, get(ENV_DELAY_MS))?,
        };

        let interval = match get(ENV_INTERVAL_SECS) {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a whole number", ENV_INTERVAL_SECS))?;
                if secs == 0 {
                    bail!("{} must be greater than 0", ENV_INTERVAL_SECS);
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            trigger_url,
            token,
            params,
            interval,
        })
    }
}

fn parse_number(key: &str, value: Option<String>) -> Result<Option<i64>> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<i64>()
                .with_context(|| format!("{} must be an integer, got {:?}", key, raw))
        })
        .transpose()
}

/// Builds the client the relay posts with
pub fn build_relay_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("clipcrawl-relay/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("Failed to build relay HTTP client")
}

/// Sends one trigger request and returns the response body
///
/// A non-2xx answer is an error carrying the status and body.
pub async fn send_once(client: &Client, config: &RelayConfig) -> Result<serde_json::Value> {
    tracing::info!("Relaying crawl trigger to {}", config.trigger_url);

    let response = client
        .post(config.trigger_url.clone())
        .bearer_auth(&config.token)
        .json(&config.params)
        .send()
        .await
        .context("Trigger request failed")?;

    let status = response.status();
    let body = response
        .text()
        .await
        .context("Failed to read trigger response")?;

    if !status.is_success() {
        bail!("Trigger endpoint answered {}: {}", status, body);
    }

    let value = serde_json::from_str(&body).context("Trigger response is not JSON")?;
    tracing::info!("Trigger accepted ({})", status);
    Ok(value)
}

/// Sends once, or forever at the configured interval
///
/// In repeat mode a failed send is logged and the next tick still fires.
pub async fn run(config: RelayConfig) -> Result<()> {
    let client = build_relay_client()?;

    let Some(period) = config.interval else {
        send_once(&client, &config).await?;
        return Ok(());
    };

    tracing::info!("Relay running every {:?}", period);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = send_once(&client, &config).await {
            tracing::error!("Relay run failed: {:#}", e);
        }
    }
}
