//! Fallback plan for the flaky platform.
//!
//! Order: web/original, web/canonical, app/original, app/canonical. The
//! canonical form is skipped when the URL has no numeric video id, and
//! repeated (url, variant) pairs are dropped.

use regex::Regex;
use std::sync::LazyLock;

use crate::extractor::RetrievalVariant;

static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/video/(\d+)").expect("valid video id regex"));

const CANONICAL_PREFIX: &str = "https://www.tiktok.com/@_/video/";

/// One extractor invocation in the plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attempt {
    pub url: String,
    pub variant: RetrievalVariant,
}

impl Attempt {
    fn new(url: &str, variant: RetrievalVariant) -> Self {
        Self {
            url: url.to_string(),
            variant,
        }
    }
}

/// `https://www.tiktok.com/@_/video/<id>` for the first `/video/<digits>` in `url`.
pub fn canonicalize_video_url(url: &str) -> Option<String> {
    let id = VIDEO_ID_RE.captures(url)?.get(1)?.as_str();
    Some(format!("{CANONICAL_PREFIX}{id}"))
}

pub fn build_attempt_plan(url: &str) -> Vec<Attempt> {
    let canonical = canonicalize_video_url(url);
    let canonical = canonical.as_deref();

    let candidates = [
        Some(Attempt::new(url, RetrievalVariant::Web)),
        canonical.map(|c| Attempt::new(c, RetrievalVariant::Web)),
        Some(Attempt::new(url, RetrievalVariant::App)),
        canonical.map(|c| Attempt::new(c, RetrievalVariant::App)),
    ];

    let mut plan: Vec<Attempt> = Vec::with_capacity(candidates.len());
    for attempt in candidates.into_iter().flatten() {
        if !plan.contains(&attempt) {
            plan.push(attempt);
        }
    }
    plan
}
