//! Media and link extraction from fetched pages
//!
//! This module turns a page body into:
//! - Media candidates: an exercise label and a video URL found together
//! - Outbound links to hand back to the frontier
//!
//! Extraction never fails. Content that cannot be understood simply yields
//! nothing.
//!
//! # Pairing Rules
//!
//! A video source is a `<video>` (its `src` or first `<source src>`), an
//! `<iframe>` on a known video host, or an `<a href>` pointing at a video.
//! Starting from the source element, up to `MAX_BLOCK_HOPS` ancestors are
//! checked. The first content block (`article`, `section`, `figure`, `li`,
//! `div`, `main`) that carries a label decides the name. Labels are looked
//! up in priority order: `data-exercise-name`/`data-exercise` attributes,
//! `.exercise-name`/`.exercise-title`, `figcaption`, then headings.
//! A block that contains more than one distinct video is ambiguous and
//! pairs nothing.
//!
//! If no block pairs a page's only video, the page's only `<h1>` is used.
//! JSON-LD `VideoObject` entries with a `name` and a `contentUrl` or
//! `embedUrl` are also accepted.

use crate::media::{canonical_name, MediaCandidate};
use crate::url::resolve_href;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// How far above a video element a label may sit
const MAX_BLOCK_HOPS: usize = 4;

const BLOCK_TAGS: &[&str] = &["article", "section", "figure", "li", "div", "main"];

const VIDEO_ELEMENTS: &str = "video, iframe[src], a[href]";

const LABEL_SELECTORS: &[&str] = &[
    "[data-exercise-name], [data-exercise]",
    ".exercise-name, .exercise-title",
    "figcaption",
    "h1, h2, h3, h4, h5, h6",
];

const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".mov", ".m4v", ".m3u8"];

/// Labels that describe the player rather than the exercise
const GENERIC_LABELS: &[&str] = &["video", "watch", "play", "watch video", "play video"];

/// Everything extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    pub candidates: Vec<MediaCandidate>,
    /// Absolute http(s) links, deduplicated, in document order
    pub links: Vec<Url>,
}

impl ExtractedPage {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() && self.links.is_empty()
    }
}

/// Extracts media candidates and outbound links from a page body
///
/// # Example
///
/// ```
/// use clipcrawl::crawler::extract;
/// use url::Url;
///
/// let html = r#"<article><h2>Goblet Squat</h2>
///     <iframe src="https://www.youtube.com/embed/abc123"></iframe></article>
///     <a href="/lunges">Lunges</a>"#;
/// let source = Url::parse("https://example.com/legs").unwrap();
/// let page = extract(html, &source);
///
/// assert_eq!(page.candidates[0].name, "Goblet Squat");
/// assert_eq!(page.links[0].as_str(), "https://example.com/lunges");
/// ```
pub fn extract(content: &str, source_url: &Url) -> ExtractedPage {
    if content.trim().is_empty() {
        return ExtractedPage::default();
    }

    let document = Html::parse_document(content);

    let mut candidates = extract_block_candidates(&document, source_url);
    candidates.extend(extract_json_ld_candidates(&document, source_url));

    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert((c.name.clone(), c.video_url.clone())));

    ExtractedPage {
        candidates,
        links: extract_links(&document, source_url),
    }
}

fn extract_block_candidates(document: &Html, source_url: &Url) -> Vec<MediaCandidate> {
    let Ok(video_selector) = Selector::parse(VIDEO_ELEMENTS) else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    let mut page_videos: Vec<Url> = Vec::new();

    for element in document.select(&video_selector) {
        let Some(video_url) = video_source(&element, source_url) else {
            continue;
        };
        if !page_videos.contains(&video_url) {
            page_videos.push(video_url.clone());
        }

        if let Some(name) = label_for(&element, &video_selector, source_url) {
            candidates.push(MediaCandidate::new(name, video_url, source_url.as_str()));
        }
    }

    if candidates.is_empty() && page_videos.len() == 1 {
        if let Some(name) = single_page_heading(document) {
            tracing::trace!("Pairing sole video on {} with page heading", source_url);
            candidates.push(MediaCandidate::new(
                name,
                page_videos.remove(0),
                source_url.as_str(),
            ));
        }
    }

    candidates
}

/// Returns the video URL an element points at, if it is a video source
fn video_source(element: &ElementRef, base_url: &Url) -> Option<Url> {
    let value = element.value();
    match value.name() {
        "video" => {
            let direct = value
                .attr("src")
                .or_else(|| value.attr("data-src"))
                .and_then(|src| resolve_href(src, base_url));
            direct.or_else(|| {
                let source_selector = Selector::parse("source[src]").ok()?;
                element
                    .select(&source_selector)
                    .filter_map(|s| s.value().attr("src"))
                    .find_map(|src| resolve_href(src, base_url))
            })
        }
        "iframe" => value
            .attr("src")
            .and_then(|src| resolve_href(src, base_url))
            .filter(is_video_url),
        "a" => value
            .attr("href")
            .and_then(|href| resolve_href(href, base_url))
            .filter(is_video_url),
        _ => None,
    }
}

/// Walks up from a video element looking for an unambiguous labeled block
fn label_for(element: &ElementRef, video_selector: &Selector, base_url: &Url) -> Option<String> {
    if let Some(name) = attribute_label(element) {
        return Some(name);
    }

    let blocks = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|e| !matches!(e.value().name(), "body" | "html"))
        .take(MAX_BLOCK_HOPS);

    for block in blocks {
        if let Some(name) = attribute_label(&block) {
            return Some(name);
        }

        if !BLOCK_TAGS.contains(&block.value().name()) {
            continue;
        }

        let Some(name) = block_label(&block) else {
            continue;
        };

        let distinct_videos: HashSet<Url> = block
            .select(video_selector)
            .filter_map(|e| video_source(&e, base_url))
            .collect();
        if distinct_videos.len() > 1 {
            tracing::trace!("Skipping ambiguous block labeled '{}'", name);
            return None;
        }

        return Some(name);
    }

    None
}

fn attribute_label(element: &ElementRef) -> Option<String> {
    let value = element.value();
    value
        .attr("data-exercise-name")
        .or_else(|| value.attr("data-exercise"))
        .and_then(plausible_name)
}

fn block_label(block: &ElementRef) -> Option<String> {
    for css in LABEL_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };

        for labeled in block.select(&selector) {
            let from_attr = attribute_label(&labeled);
            let name = from_attr.or_else(|| plausible_name(&labeled.text().collect::<String>()));
            if name.is_some() {
                return name;
            }
        }
    }

    None
}

fn single_page_heading(document: &Html) -> Option<String> {
    let selector = Selector::parse("h1").ok()?;
    let mut headings = document.select(&selector);
    let first = headings.next()?;
    if headings.next().is_some() {
        return None;
    }
    plausible_name(&first.text().collect::<String>())
}

/// Canonicalizes a label and rejects ones that cannot be an exercise name
fn plausible_name(raw: &str) -> Option<String> {
    let name = canonical_name(raw)?;
    let length = name.chars().count();

    if !(2..=100).contains(&length) || !name.chars().any(char::is_alphabetic) {
        return None;
    }

    if GENERIC_LABELS.contains(&name.to_lowercase().as_str()) {
        return None;
    }

    Some(name)
}

/// Returns true for URLs that point at a video rather than a page
pub fn is_video_url(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    if VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return true;
    }

    let host = url.host_str().unwrap_or("").to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let first_segment = url
        .path_segments()
        .and_then(|mut s| s.next())
        .unwrap_or("");

    match host {
        "youtube.com" | "m.youtube.com" | "youtube-nocookie.com" => {
            ["/embed/", "/shorts/", "/v/"]
                .iter()
                .any(|p| path.starts_with(p))
                || (path == "/watch" && url.query_pairs().any(|(k, _)| k == "v"))
        }
        "youtu.be" => !first_segment.is_empty(),
        "vimeo.com" => !first_segment.is_empty() && first_segment.chars().all(|c| c.is_ascii_digit()),
        "player.vimeo.com" => path.starts_with("/video/"),
        "fast.wistia.net" | "fast.wistia.com" => path.starts_with("/embed/"),
        _ => false,
    }
}

fn extract_json_ld_candidates(document: &Html, source_url: &Url) -> Vec<MediaCandidate> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    for script in document.select(&selector) {
        let text = script.text().collect::<String>();
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => collect_video_objects(&value, source_url, &mut candidates),
            Err(e) => tracing::trace!("Ignoring unparsable JSON-LD on {}: {}", source_url, e),
        }
    }
    candidates
}

fn collect_video_objects(value: &Value, source_url: &Url, out: &mut Vec<MediaCandidate>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_video_objects(item, source_url, out);
            }
        }
        Value::Object(map) => {
            if is_video_object(value) {
                let name = map.get("name").and_then(Value::as_str).and_then(plausible_name);
                let url = ["contentUrl", "embedUrl"]
                    .iter()
                    .filter_map(|key| map.get(*key).and_then(Value::as_str))
                    .find_map(|u| resolve_href(u, source_url));
                if let (Some(name), Some(url)) = (name, url) {
                    out.push(MediaCandidate::new(name, url, source_url.as_str()));
                }
            }
            for nested in map.values() {
                collect_video_objects(nested, source_url, out);
            }
        }
        _ => {}
    }
}

fn is_video_object(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "VideoObject",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("VideoObject")),
        _ => false,
    }
}

/// Extracts followable links
///
/// Includes `<a href>` (minus `download` anchors) and canonical links.
/// Video URLs are excluded since they are media, not pages.
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    for css in ["a[href]", "link[rel='canonical'][href]"] {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };

        for element in document.select(&selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            let Some(link) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_href(href, base_url))
            else {
                continue;
            };

            if is_video_url(&link) {
                continue;
            }

            if seen.insert(link.as_str().to_string()) {
                links.push(link);
            }
        }
    }

    links
}
