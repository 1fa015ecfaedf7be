//! URL handling module for Clipcrawl
//!
//! This module provides URL normalization and host extraction. Normalized
//! URLs are what the crawler fetches and what the visited set remembers.

mod host;
mod normalize;

pub use host::{extract_host, same_host};
pub use normalize::{normalize_url, resolve_href};
