//! Transient-failure detection for the flaky platform's fallback loop.

/// Text every recoverable failure must mention (the extractor prefixes its
/// errors with the extractor key, e.g. `[TikTok]`).
const FLAKY_PLATFORM_MARKER: &str = "tiktok";

/// Extractor messages known to clear up with a different request variant.
const TRANSIENT_PHRASES: &[&str] = &[
    "unable to extract webpage video data",
    "unable to download webpage",
    "video not available",
    "extractorerror",
];

/// True when `message` is a transient extraction failure of the flaky platform.
pub fn is_recoverable(message: &str) -> bool {
    let msg = message.to_lowercase();
    msg.contains(FLAKY_PLATFORM_MARKER) && TRANSIENT_PHRASES.iter().any(|p| msg.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_and_phrase_is_recoverable() {
        assert!(is_recoverable(
            "ERROR: [TikTok] 7301: Video not available, status code 10204"
        ));
        assert!(is_recoverable(
            "ERROR: [TikTok] 7301: Unable to extract webpage video data"
        ));
        assert!(is_recoverable("tiktok: ExtractorError raised"));
    }

    #[test]
    fn phrase_without_platform_is_terminal() {
        assert!(!is_recoverable("ERROR: [youtube] abc: Video not available"));
        assert!(!is_recoverable("Video not available"));
    }

    #[test]
    fn platform_without_phrase_is_terminal() {
        assert!(!is_recoverable("ERROR: [TikTok] 7301: HTTP Error 403: Forbidden"));
    }
}
