use crate::UrlError;
use url::Url;

/// Query parameters that only carry tracking information
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref", "igshid"];

/// Normalizes a URL into the form used for fetching and deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only http and https schemes
/// 3. Require a host (the parser lowercases it)
/// 4. Remove fragment
/// 5. Remove tracking query parameters
/// 6. Sort remaining query parameters by key
/// 7. Drop an empty query string
///
/// The path is kept as the parser resolves it. A trailing slash names a
/// different resource on many servers, so it is never added or removed.
///
/// # Examples
///
/// ```
/// use clipcrawl::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.COM/squat/?utm_source=x#video").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/squat/");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Resolves an href found on a page to an absolute http(s) URL
///
/// Returns None for empty hrefs, fragment-only anchors, `javascript:`,
/// `mailto:`, `tel:` and `data:` links, and anything that fails to resolve.
pub fn resolve_href(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}

fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));
    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(input: &str) -> String {
        normalize_url(input).unwrap().to_string()
    }

    #[test]
    fn test_http_is_not_upgraded() {
        assert_eq!(norm("http://exrx.net/Lists"), "http://exrx.net/Lists");
    }

    #[test]
    fn test_trailing_slash_preserved() {
        assert_eq!(norm("https://exrx.net/Lists/"), "https://exrx.net/Lists/");
        assert_eq!(norm("https://exrx.net/Lists"), "https://exrx.net/Lists");
        assert_eq!(norm("https://exrx.net"), "https://exrx.net/");
        assert_eq!(
            norm("https://www.acefitness.org/resources/everyone/exercise-library/"),
            "https://www.acefitness.org/resources/everyone/exercise-library/"
        );
    }

    #[test]
    fn test_fragment_dropped() {
        assert_eq!(
            norm("https://exrx.net/Lists/Directory#legs"),
            "https://exrx.net/Lists/Directory"
        );
    }

    #[test]
    fn test_tracking_params_dropped_and_rest_sorted() {
        assert_eq!(
            norm("https://gym.example.com/moves?page=2&utm_campaign=x&cat=legs&gclid=9"),
            "https://gym.example.com/moves?cat=legs&page=2"
        );
        assert_eq!(
            norm("https://gym.example.com/moves?utm_source=a&fbclid=b&ref=c"),
            "https://gym.example.com/moves"
        );
    }

    #[test]
    fn test_lowercase_host_keeps_path_case() {
        assert_eq!(
            norm("https://GYM.Example.COM/Exercises/Squat"),
            "https://gym.example.com/Exercises/Squat"
        );
    }

    #[test]
    fn test_dot_segments_resolved() {
        assert_eq!(
            norm("https://gym.example.com/exercises/./legs/../arms"),
            "https://gym.example.com/exercises/arms"
        );
    }

    #[test]
    fn test_equivalent_forms_share_one_key() {
        let forms = [
            "https://gym.example.com/squat",
            "https://gym.example.com/squat#video",
            "https://gym.example.com/squat?utm_source=feed#video",
            " https://GYM.example.com/squat?utm_medium=email ",
        ];
        assert!(forms.iter().all(|f| norm(f) == "https://gym.example.com/squat"));
    }

    #[test]
    fn test_rejects_non_web_schemes() {
        assert!(matches!(
            normalize_url("ftp://gym.example.com/clip"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(matches!(
            normalize_url("mailto:coach@example.com"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_rejects_unparsable_input() {
        assert!(normalize_url("squat video").is_err());
        assert!(normalize_url("/exercises/squat").is_err());
        assert!(normalize_url("").is_err());
    }

    #[test]
    fn test_resolve_relative_href() {
        let base = Url::parse("https://gym.example.com/exercises/legs").unwrap();
        assert_eq!(
            resolve_href("squat", &base).unwrap().as_str(),
            "https://gym.example.com/exercises/squat"
        );
        assert_eq!(
            resolve_href("/arms", &base).unwrap().as_str(),
            "https://gym.example.com/arms"
        );
        assert_eq!(
            resolve_href("//cdn.example.com/clip.mp4", &base).unwrap().as_str(),
            "https://cdn.example.com/clip.mp4"
        );
    }

    #[test]
    fn test_resolve_skips_non_navigable_hrefs() {
        let base = Url::parse("https://gym.example.com/").unwrap();
        for href in [
            "javascript:void(0)",
            "MAILTO:coach@example.com",
            "tel:+1234",
            "data:text/html,hi",
            "#top",
            "   ",
        ] {
            assert!(resolve_href(href, &base).is_none(), "{} resolved", href);
        }
    }
}
