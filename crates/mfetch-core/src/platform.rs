//! Source platform detection and URL input checks.
//!
//! Runs before admission: anything classified [`Platform::Unknown`] is
//! rejected and never reaches the worker pool.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)https?://[^\s<>'"()\[\]{}]+"#).expect("valid URL regex"));

static DIRECT_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:https?://)?\S+\.(?:mp4|mkv|webm|avi|mov|wmv|flv|mp3|m4a|wav|aac|ogg)(?:\?[^#\s]*)?(?:#\S*)?$",
    )
    .expect("valid direct-file regex")
});

const MAX_URL_LEN: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    YouTube,
    TikTok,
    Instagram,
    Facebook,
    Twitter,
    Vk,
    Reddit,
    Pinterest,
    Dailymotion,
    Vimeo,
    SoundCloud,
    /// A plain media file served over HTTP.
    Direct,
    Unknown,
}

/// Host suffixes per platform, checked in order.
const HOSTS: &[(Platform, &[&str])] = &[
    (Platform::YouTube, &["youtube.com", "youtu.be"]),
    (Platform::TikTok, &["tiktok.com"]),
    (Platform::Instagram, &["instagram.com"]),
    (Platform::Facebook, &["facebook.com", "fb.watch"]),
    (Platform::Twitter, &["twitter.com", "x.com"]),
    (Platform::Vk, &["vk.com", "vkvideo.ru"]),
    (Platform::Reddit, &["reddit.com", "redd.it"]),
    (Platform::Pinterest, &["pinterest.com", "pin.it"]),
    (Platform::Dailymotion, &["dailymotion.com"]),
    (Platform::Vimeo, &["vimeo.com"]),
    (Platform::SoundCloud, &["soundcloud.com"]),
];

impl Platform {
    pub fn name(self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::TikTok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::Facebook => "Facebook",
            Platform::Twitter => "Twitter/X",
            Platform::Vk => "VK",
            Platform::Reddit => "Reddit",
            Platform::Pinterest => "Pinterest",
            Platform::Dailymotion => "Dailymotion",
            Platform::Vimeo => "Vimeo",
            Platform::SoundCloud => "SoundCloud",
            Platform::Direct => "Direct Link",
            Platform::Unknown => "Unknown",
        }
    }

    /// Platform whose extractor needs the multi-attempt fallback plan.
    pub fn is_flaky(self) -> bool {
        self == Platform::TikTok
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Detect the source platform of `url`.
pub fn detect_platform(url: &str) -> Platform {
    let url = url.trim();
    if url.is_empty() {
        return Platform::Unknown;
    }
    if let Some(host) = url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
    {
        let found = HOSTS
            .iter()
            .find(|(_, domains)| domains.iter().any(|d| host_matches(&host, d)));
        if let Some((platform, _)) = found {
            return *platform;
        }
    }
    if DIRECT_FILE_RE.is_match(url) {
        return Platform::Direct;
    }
    Platform::Unknown
}

pub fn is_supported_url(url: &str) -> bool {
    detect_platform(url) != Platform::Unknown
}

/// First http(s) URL appearing in free text.
pub fn find_first_url(text: &str) -> Option<&str> {
    URL_RE.find(text).map(|m| m.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlInputError {
    #[error("URL must not be empty")]
    Empty,
    #[error("URL is longer than 2000 characters")]
    TooLong,
    #[error("only HTTP/HTTPS URLs are supported")]
    UnsupportedScheme,
    #[error("malformed URL")]
    Malformed,
}

/// Syntactic check of user-supplied URL text.
pub fn validate_url_input(url: &str) -> Result<(), UrlInputError> {
    if url.is_empty() {
        return Err(UrlInputError::Empty);
    }
    if url.len() > MAX_URL_LEN {
        return Err(UrlInputError::TooLong);
    }
    let parsed = url::Url::parse(url).map_err(|_| UrlInputError::Malformed)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UrlInputError::UnsupportedScheme);
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(UrlInputError::Malformed),
    }
}
