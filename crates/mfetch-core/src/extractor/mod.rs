//! Media extraction behind a trait.
//!
//! The fetcher only needs "put the media for this URL into this directory";
//! [`YtDlpExtractor`] does that by running the `yt-dlp` executable. Calls are
//! blocking and are made from `spawn_blocking`.

mod options;
mod ytdlp;

pub use options::{
    BrowserCookies, Credentials, ExtractOptions, ExtractSettings, ExtractorArg, RetrievalVariant,
    OUTPUT_TEMPLATE,
};
pub use ytdlp::{summarize_stderr, YtDlpExtractor};

use std::path::PathBuf;

/// One extractor invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractRequest {
    pub url: String,
    pub variant: RetrievalVariant,
    /// Directory the output template points into.
    pub output_dir: PathBuf,
    pub options: ExtractOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("extractor timed out after {0}s")]
    TimedOut(u64),
    /// Non-zero exit; carries the extractor's own error text.
    #[error("{0}")]
    Failed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait Extractor: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch `request.url` into `request.output_dir`. Returns once the
    /// extractor has exited; the caller picks the produced file.
    fn extract(&self, request: &ExtractRequest) -> Result<(), ExtractError>;
}
