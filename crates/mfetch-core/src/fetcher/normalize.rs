//! Resolving TikTok share links to a video page URL.

use std::time::Duration;

use crate::http::HttpClient;
use crate::url_model::strip_tracking_params;

use super::html::extract_video_page_url;

pub(crate) const MOBILE_SAFARI_UA: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";

/// Hosts whose links may redirect to the real video page.
const SHORTENER_HOSTS: &[&str] = &[
    "vm.tiktok.com",
    "vt.tiktok.com",
    "m.tiktok.com",
    "www.tiktok.com",
    "tiktok.com",
];

const HEAD_TIMEOUT: Duration = Duration::from_secs(10);
const GET_TIMEOUT: Duration = Duration::from_secs(12);

fn is_shortener(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| SHORTENER_HOSTS.contains(&host.as_str()))
}

fn ua_headers() -> [(String, String); 1] {
    [("User-Agent".to_string(), MOBILE_SAFARI_UA.to_string())]
}

/// Video page URL for a TikTok link, or `None` when it cannot be determined.
///
/// Short links are followed (HEAD, then GET if HEAD fails), tracking
/// parameters are dropped, and a URL without `/video/` is resolved by
/// scanning the page it points to.
pub fn resolve_flaky_url(http: &dyn HttpClient, url: &str) -> Option<String> {
    let headers = ua_headers();

    let final_url = if is_shortener(url) {
        match http.resolve_head(url, &headers, HEAD_TIMEOUT) {
            Ok(u) => u,
            Err(head_err) => {
                tracing::debug!(url, error = %head_err, "HEAD redirect resolution failed, trying GET");
                match http.fetch_text(url, &headers, GET_TIMEOUT) {
                    Ok(resp) => resp.effective_url,
                    Err(e) => {
                        tracing::warn!(url, error = %e, "could not resolve TikTok link");
                        return None;
                    }
                }
            }
        }
    } else {
        url.to_string()
    };

    let clean = strip_tracking_params(&final_url);
    if clean.contains("/video/") {
        return Some(clean);
    }

    let page = match http.fetch_text(&final_url, &headers, GET_TIMEOUT) {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(url = %final_url, error = %e, "could not fetch TikTok page");
            return None;
        }
    };
    if page.status != 200 {
        tracing::debug!(url = %final_url, status = page.status, "TikTok page fetch not OK");
        return None;
    }
    extract_video_page_url(&page.body)
}
