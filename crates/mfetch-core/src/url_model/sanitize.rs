//! Filesystem-safe filenames.

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

fn is_reserved(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
}

/// Sanitizes a candidate filename.
///
/// - Replaces `< > : " / \ | ? *` with `_` and drops control characters
/// - Trims surrounding whitespace and dots
/// - Limits length to 255 bytes without splitting a character
///
/// May return an empty string; callers pick their own fallback.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if is_reserved(c) { '_' } else { c })
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}
