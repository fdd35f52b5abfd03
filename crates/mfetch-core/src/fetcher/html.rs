//! Scraping TikTok page HTML for video links and raw media URLs.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use crate::http::HttpClient;

use super::normalize::MOBILE_SAFARI_UA;

static PAGE_VIDEO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"/@([^/"'\s<>\\]+)/video/(\d+)"#).expect("valid page video regex")
});

static ITEM_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""itemId"\s*:\s*"(\d+)""#).expect("valid itemId regex"));

/// Keys holding a media URL, watermark-free first.
static MEDIA_ADDR_RES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    ["downloadAddr", "playAddr"].map(|key| {
        Regex::new(&format!(
            r#""{key}"\s*:\s*"(https?:(?:\\/\\/|\\u002[Ff]\\u002[Ff]|//)[^"]+)""#
        ))
        .expect("valid media address regex")
    })
});

/// Canonical video page URL found in a TikTok page.
pub fn extract_video_page_url(html: &str) -> Option<String> {
    if let Some(caps) = PAGE_VIDEO_RE.captures(html) {
        return Some(format!(
            "https://www.tiktok.com/@{}/video/{}",
            &caps[1], &caps[2]
        ));
    }
    ITEM_ID_RE
        .captures(html)
        .map(|caps| format!("https://www.tiktok.com/@_/video/{}", &caps[1]))
}

/// Direct media URL embedded in the page JSON.
pub fn extract_media_url(html: &str) -> Option<String> {
    MEDIA_ADDR_RES.iter().find_map(|re| {
        let raw = re.captures(html)?.get(1)?.as_str();
        let url = unescape_media_url(raw);
        (url.starts_with("http://") || url.starts_with("https://")).then_some(url)
    })
}

/// Undo JSON and HTML escaping in a scraped URL.
pub fn unescape_media_url(raw: &str) -> String {
    let url = raw
        .replace("\\/", "/")
        .replace("\\u002F", "/")
        .replace("\\u002f", "/")
        .replace("\\u0026", "&");
    decode_html_entities(&url)
}

fn decode_html_entities(text: &str) -> String {
    const ENTITIES: &[(&str, &str)] = &[
        ("&quot;", "\""),
        ("&#34;", "\""),
        ("&#39;", "'"),
        ("&#x27;", "'"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&#x2F;", "/"),
        ("&amp;", "&"),
    ];
    ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (entity, ch)| acc.replace(entity, ch))
}

const PAGE_TIMEOUT: Duration = Duration::from_secs(15);
const TIKTOK_REFERER: &str = "https://www.tiktok.com/";

/// Last resort for TikTok video: fetch the page, pull the embedded media URL
/// and stream it to `tiktok_<unix_secs>.mp4` in `dir`. Any failure gives `None`.
pub fn download_from_page(
    http: &dyn HttpClient,
    page_url: &str,
    dir: &Path,
    download_timeout: Duration,
    unix_secs: u64,
) -> Option<PathBuf> {
    let headers = [
        ("User-Agent".to_string(), MOBILE_SAFARI_UA.to_string()),
        ("Referer".to_string(), TIKTOK_REFERER.to_string()),
    ];

    let page = match http.fetch_text(page_url, &headers, PAGE_TIMEOUT) {
        Ok(page) if page.status == 200 => page,
        Ok(page) => {
            tracing::debug!(url = page_url, status = page.status, "page fallback: not OK");
            return None;
        }
        Err(e) => {
            tracing::warn!("TikTok page fallback failed for {}: {}", page_url, e);
            return None;
        }
    };

    let media_url = extract_media_url(&page.body)?;
    let dest = dir.join(format!("tiktok_{unix_secs}.mp4"));
    match http.download_to_file(&media_url, &dest, &headers, download_timeout) {
        Ok(bytes) if dest.exists() => {
            tracing::info!(bytes, "TikTok page fallback succeeded");
            Some(dest)
        }
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("TikTok page fallback failed for {}: {}", page_url, e);
            None
        }
    }
}
