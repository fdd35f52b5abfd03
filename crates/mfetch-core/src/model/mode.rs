//! Requested output kind and the file extensions that satisfy it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "avi", "mov", "wmv", "flv"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "wav", "aac", "ogg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaMode {
    Video,
    Audio,
}

impl MediaMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaMode::Video => "video",
            MediaMode::Audio => "audio",
        }
    }

    /// Extensions (lowercase, without the dot) accepted as output for this mode.
    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            MediaMode::Video => VIDEO_EXTENSIONS,
            MediaMode::Audio => AUDIO_EXTENSIONS,
        }
    }

    /// Extension appended to direct downloads whose name has none.
    pub fn default_extension(self) -> &'static str {
        match self {
            MediaMode::Video => "mp4",
            MediaMode::Audio => "mp3",
        }
    }

    pub fn accepts_extension(self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.allowed_extensions()
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for MediaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown download mode {0:?} (expected video or audio)")]
pub struct ParseModeError(String);

impl FromStr for MediaMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(MediaMode::Video),
            "audio" => Ok(MediaMode::Audio),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}
