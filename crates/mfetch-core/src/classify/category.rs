//! User-facing failure categories.

use std::fmt;

/// Longest diagnostic string handed to the presentation layer, in characters.
pub const DIAGNOSTIC_LIMIT: usize = 350;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    DrmProtected,
    Unsupported,
    TooLarge,
    TimedOut,
    DiskSpace,
    ExtractorOutage,
    Unavailable,
    Generic,
}

/// Ordered rules; the first category with a matching needle wins.
const RULES: &[(FailureCategory, &[&str])] = &[
    (FailureCategory::DrmProtected, &["drm protected"]),
    (FailureCategory::Unsupported, &["unsupported"]),
    (FailureCategory::TooLarge, &["too large", "max_filesize", "max-filesize"]),
    (FailureCategory::TimedOut, &["timeout", "timed out"]),
    (FailureCategory::DiskSpace, &["disk", "space"]),
    (FailureCategory::ExtractorOutage, &["unable to extract webpage video data"]),
    (FailureCategory::Unavailable, &["video not available", "private"]),
];

/// Map failure text to a category (case-insensitive, first match wins).
pub fn categorize(message: &str) -> FailureCategory {
    let msg = message.to_lowercase();
    RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| msg.contains(n)))
        .map(|(category, _)| *category)
        .unwrap_or(FailureCategory::Generic)
}

impl FailureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCategory::DrmProtected => "drm_protected",
            FailureCategory::Unsupported => "unsupported",
            FailureCategory::TooLarge => "too_large",
            FailureCategory::TimedOut => "timed_out",
            FailureCategory::DiskSpace => "disk_space",
            FailureCategory::ExtractorOutage => "extractor_outage",
            FailureCategory::Unavailable => "unavailable",
            FailureCategory::Generic => "generic",
        }
    }

    /// One-line explanation suitable for an end user.
    pub fn summary(self) -> &'static str {
        match self {
            FailureCategory::DrmProtected => "The video is DRM protected and cannot be downloaded.",
            FailureCategory::Unsupported => "This link is not supported; send a direct link to a post or video.",
            FailureCategory::TooLarge => "The file is larger than the upload limit; try audio or another clip.",
            FailureCategory::TimedOut => "The download timed out; try again a bit later.",
            FailureCategory::DiskSpace => "Not enough disk space on the server; try again later.",
            FailureCategory::ExtractorOutage => "The platform is not returning video data right now; try again later or another link.",
            FailureCategory::Unavailable => "The video is unavailable: removed, private, or region/age restricted.",
            FailureCategory::Generic => "Could not download the media.",
        }
    }

    /// Failures caused by the content or the platform rather than by us.
    /// These are logged at warn level instead of error.
    pub fn is_expected(self) -> bool {
        matches!(
            self,
            FailureCategory::DrmProtected
                | FailureCategory::ExtractorOutage
                | FailureCategory::Unavailable
        )
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cut `text` to at most [`DIAGNOSTIC_LIMIT`] characters.
pub fn truncate_diagnostic(text: &str) -> String {
    match text.char_indices().nth(DIAGNOSTIC_LIMIT) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

/// Classified terminal failure as reported to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub category: FailureCategory,
    /// Raw failure text, truncated to [`DIAGNOSTIC_LIMIT`] characters.
    pub diagnostic: String,
}

impl FailureReport {
    pub fn new(category: FailureCategory, message: &str) -> Self {
        Self {
            category,
            diagnostic: truncate_diagnostic(message),
        }
    }

    /// Categorize `message` through the rule table.
    pub fn from_message(message: &str) -> Self {
        Self::new(categorize(message), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_by_keyword() {
        assert_eq!(categorize("ERROR: This video is DRM protected"), FailureCategory::DrmProtected);
        assert_eq!(categorize("Unsupported URL: https://x"), FailureCategory::Unsupported);
        assert_eq!(categorize("File is larger than max-filesize"), FailureCategory::TooLarge);
        assert_eq!(categorize("Read timed out."), FailureCategory::TimedOut);
        assert_eq!(categorize("No space left on device"), FailureCategory::DiskSpace);
        assert_eq!(
            categorize("[TikTok] 1: Unable to extract webpage video data"),
            FailureCategory::ExtractorOutage
        );
        assert_eq!(categorize("This video is private"), FailureCategory::Unavailable);
        assert_eq!(categorize("HTTP Error 403: Forbidden"), FailureCategory::Generic);
    }

    #[test]
    fn first_rule_wins() {
        // Both "drm protected" and "private": DRM is checked first.
        assert_eq!(
            categorize("private playlist item is DRM protected"),
            FailureCategory::DrmProtected
        );
        // Timeout beats the outage phrase.
        assert_eq!(
            categorize("Unable to extract webpage video data: connection timed out"),
            FailureCategory::TimedOut
        );
    }

    #[test]
    fn diagnostic_is_truncated_on_char_boundary() {
        let long = "é".repeat(DIAGNOSTIC_LIMIT + 20);
        let report = FailureReport::from_message(&long);
        assert_eq!(report.diagnostic.chars().count(), DIAGNOSTIC_LIMIT);
        assert_eq!(truncate_diagnostic("short"), "short");
    }

    #[test]
    fn expected_categories() {
        assert!(FailureCategory::Unavailable.is_expected());
        assert!(!FailureCategory::Generic.is_expected());
        assert!(!FailureCategory::TooLarge.is_expected());
    }
}
