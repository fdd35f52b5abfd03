//! Local filenames for direct downloads and URL cleanup.

mod path;
mod sanitize;
mod tracking;

pub use path::last_path_segment;
pub use sanitize::sanitize_filename;
pub use tracking::{strip_tracking_params, TRACKING_PARAMS};

use crate::model::MediaMode;

/// Name for a file streamed straight from `url`.
///
/// Uses the sanitized last path segment; falls back to `download_<unix_secs>`.
/// A name without any `.` gets the mode's default extension.
///
/// - `direct_filename("https://cdn.example.com/a/clip.webm", Video, 0)` → `"clip.webm"`
/// - `direct_filename("https://cdn.example.com/", Audio, 17)` → `"download_17.mp3"`
pub fn direct_filename(url: &str, mode: MediaMode, unix_secs: u64) -> String {
    let name = last_path_segment(url)
        .map(|segment| sanitize_filename(&segment))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("download_{unix_secs}"));

    if name.contains('.') {
        name
    } else {
        format!("{name}.{}", mode.default_extension())
    }
}
