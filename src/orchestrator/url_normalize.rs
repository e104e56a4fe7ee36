//! URL canonicalisation for cross-provider deduplication.
//!
//! Different providers surface the same page via different schemes,
//! tracking query parameters, or trailing slashes. Collapsing identity to
//! `host + path` catches those without attempting full canonical-URL
//! resolution.

use url::Url;

/// Dedup identity key for a result URL: lowercased host plus path with
/// any trailing slash stripped. Scheme, port, query, and fragment are
/// ignored.
///
/// Input that does not parse as an absolute URL (or has no host) falls
/// back to the raw string, so malformed URLs are only ever "equal" to an
/// identical raw string.
///
/// # Examples
///
/// ```
/// use metasearch::orchestrator::url_normalize::dedup_key;
///
/// let a = dedup_key("https://Example.COM/page/?utm_source=x");
/// let b = dedup_key("http://example.com/page");
/// assert_eq!(a, b);
/// ```
pub fn dedup_key(raw: &str) -> String {
    let Ok(parsed) = Url::parse(raw) else {
        return raw.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return raw.to_string();
    };

    // Url::parse already lowercases the host.
    let path = parsed.path().trim_end_matches('/');
    format!("{host}{path}")
}

/// Dedup key for image URLs. Image CDN URLs are frequently long opaque
/// strings with meaningful queries, so only the scheme prefix and any
/// trailing slash are stripped.
pub fn image_key(raw: &str) -> String {
    let stripped = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw);
    stripped.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_ignored() {
        assert_eq!(
            dedup_key("https://example.com/page"),
            dedup_key("http://example.com/page")
        );
    }

    #[test]
    fn query_and_fragment_ignored() {
        assert_eq!(
            dedup_key("https://example.com/page?utm=1#section"),
            "example.com/page"
        );
    }

    #[test]
    fn trailing_slash_stripped() {
        assert_eq!(dedup_key("https://example.com/page/"), "example.com/page");
        assert_eq!(dedup_key("https://example.com/"), "example.com");
    }

    #[test]
    fn host_case_folded() {
        assert_eq!(
            dedup_key("https://Example.COM/Path"),
            dedup_key("https://example.com/Path")
        );
    }

    #[test]
    fn path_case_preserved() {
        assert_ne!(
            dedup_key("https://example.com/Path"),
            dedup_key("https://example.com/path")
        );
    }

    #[test]
    fn port_ignored() {
        assert_eq!(
            dedup_key("https://example.com:8443/page"),
            "example.com/page"
        );
    }

    #[test]
    fn malformed_url_keyed_by_raw_string() {
        assert_eq!(dedup_key("not a url"), "not a url");
        assert_eq!(dedup_key(""), "");
        // Two different malformed strings stay distinct.
        assert_ne!(dedup_key("oops one"), dedup_key("oops two"));
    }

    #[test]
    fn key_is_idempotent_over_reparsing() {
        let once = dedup_key("https://example.com/page/");
        // The key itself no longer parses as a URL, so keying it again
        // falls back to the raw string unchanged.
        assert_eq!(dedup_key(&once), once);
    }

    #[test]
    fn image_key_strips_scheme_and_trailing_slash() {
        assert_eq!(
            image_key("https://cdn.example.com/img.jpg?sig=abc"),
            "cdn.example.com/img.jpg?sig=abc"
        );
        assert_eq!(
            image_key("http://cdn.example.com/img/"),
            image_key("https://cdn.example.com/img")
        );
    }
}
