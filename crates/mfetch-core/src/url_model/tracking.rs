//! Removal of analytics query parameters.

use url::Url;

/// Query keys dropped before a URL is handed to the extractor.
pub const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
];

/// `url` without tracking query parameters. Unparsable input is returned unchanged.
pub fn strip_tracking_params(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if parsed.query().is_none() {
        return parsed.into();
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.to_ascii_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }
    parsed.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_only_tracking_keys() {
        assert_eq!(
            strip_tracking_params("https://www.tiktok.com/@a/video/1?utm_source=x&lang=en&fbclid=y"),
            "https://www.tiktok.com/@a/video/1?lang=en"
        );
    }

    #[test]
    fn tracking_keys_match_case_insensitively() {
        assert_eq!(
            strip_tracking_params("https://www.tiktok.com/@a/video/1?UTM_SOURCE=x&Fbclid=y&lang=en"),
            "https://www.tiktok.com/@a/video/1?lang=en"
        );
    }

    #[test]
    fn removes_empty_query() {
        assert_eq!(
            strip_tracking_params("https://www.tiktok.com/@a/video/1?utm_campaign=c&gclid=g"),
            "https://www.tiktok.com/@a/video/1"
        );
    }

    #[test]
    fn leaves_other_urls_alone() {
        assert_eq!(
            strip_tracking_params("https://example.com/a?b=1"),
            "https://example.com/a?b=1"
        );
        assert_eq!(strip_tracking_params("not a url"), "not a url");
    }
}
