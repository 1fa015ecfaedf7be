use serde::{Deserialize, Serialize};
use url::Url;

/// An (exercise name, video URL) pair found on a page
///
/// Candidates are transient: they are never stored directly, only fed to
/// the upsert coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCandidate {
    /// Canonical exercise label
    pub name: String,
    /// Absolute URL of the demonstration video
    pub video_url: String,
    /// Page the pair was found on; empty for manual entries
    #[serde(default)]
    pub source_url: String,
}

impl MediaCandidate {
    pub fn new(
        name: impl Into<String>,
        video_url: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            video_url: video_url.into(),
            source_url: source_url.into(),
        }
    }

    /// Returns the canonical form of this candidate, or None when the name
    /// is blank or the video URL is not an absolute http(s) URL
    pub fn validated(&self) -> Option<Self> {
        let name = canonical_name(&self.name)?;
        let video_url = Url::parse(self.video_url.trim()).ok()?;
        if !matches!(video_url.scheme(), "http" | "https") || video_url.host_str().is_none() {
            return None;
        }

        Some(Self {
            name,
            video_url: video_url.to_string(),
            source_url: self.source_url.clone(),
        })
    }
}

/// Trims a label and collapses runs of inner whitespace
///
/// Returns None for labels that are empty after trimming.
pub fn canonical_name(raw: &str) -> Option<String> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_name_collapses_whitespace() {
        assert_eq!(
            canonical_name("  Barbell \n  Back   Squat "),
            Some("Barbell Back Squat".to_string())
        );
        assert_eq!(canonical_name(" \t "), None);
    }

    #[test]
    fn test_validated_accepts_absolute_http_url() {
        let candidate = MediaCandidate::new(" Squat ", "https://youtu.be/abc", "https://a.com/");
        let valid = candidate.validated().unwrap();
        assert_eq!(valid.name, "Squat");
        assert_eq!(valid.video_url, "https://youtu.be/abc");
    }

    #[test]
    fn test_validated_rejects_malformed() {
        assert!(MediaCandidate::new("", "https://youtu.be/abc", "").validated().is_none());
        assert!(MediaCandidate::new("Squat", "", "").validated().is_none());
        assert!(MediaCandidate::new("Squat", "/videos/squat.mp4", "").validated().is_none());
        assert!(MediaCandidate::new("Squat", "ftp://a.com/squat.mp4", "").validated().is_none());
    }
}
