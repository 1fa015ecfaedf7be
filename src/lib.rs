//! Clipcrawl: an exercise-video ingestion crawler
//!
//! This crate crawls fitness sites breadth-first under a page budget and a
//! politeness delay, extracts (exercise name, video URL) pairs and upserts
//! them into a media store keyed by exercise name.

pub mod admin;
pub mod config;
pub mod crawler;
pub mod media;
pub mod relay;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Clipcrawl operations
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] admin::AuthError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The crawl task panicked or was cancelled before producing a summary
    #[error("Crawl job failed: {0}")]
    Job(#[from] tokio::task::JoinError),
}

impl IngestError {
    /// Returns true if the error was caused by the caller's input rather
    /// than by a failure inside the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::InvalidConfig(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Clipcrawl operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use admin::{AdminToken, AdminTrigger};
pub use config::{CrawlConfig, CrawlParams, Settings};
pub use crawler::{CrawlJob, CrawlSummary, JobState};
pub use media::{MediaCandidate, UpsertCoordinator};
pub use storage::{MediaRecord, MediaStore, SqliteStorage};
pub use crate::url::normalize_url;
