//! Configuration module for Clipcrawl
//!
//! Two kinds of configuration live here: the service `Settings` loaded from
//! a TOML file at startup, and the per-job `CrawlConfig` resolved from the
//! parameters of each trigger request.
//!
//! # Example
//!
//! ```no_run
//! use clipcrawl::config::load_settings;
//! use std::path::Path;
//!
//! let settings = load_settings(Path::new("clipcrawl.toml")).unwrap();
//! println!("Admin API on {}", settings.server.bind);
//! ```

mod crawl;
mod parser;
mod types;
mod validation;

pub use crawl::{
    CrawlConfig, CrawlDefaults, CrawlParams, DEFAULT_DELAY_MS, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_PAGES, DEFAULT_SEEDS,
};
pub use types::{CrawlerConfig, LinkPolicy, OutputConfig, ServerConfig, Settings, UserAgentConfig};

pub use parser::{compute_config_hash, load_settings, load_settings_with_hash};
