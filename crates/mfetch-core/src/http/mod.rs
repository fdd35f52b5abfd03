//! Raw HTTP transfers used by the fetcher.
//!
//! Everything here is blocking; the fetcher calls it from `spawn_blocking`.

mod curl_http;

pub use curl_http::CurlHttp;

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default user agent for page requests and extractor runs.
pub(crate) const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Extra request headers as (name, value) pairs.
pub type Headers = [(String, String)];

/// Failure of one HTTP operation.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u32 },
    #[error("writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Body and final location of a text GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResponse {
    pub status: u32,
    /// URL after following redirects.
    pub effective_url: String,
    pub body: String,
}

pub trait HttpClient: Send + Sync {
    /// GET `url` and stream the body into `dest`. Returns bytes written.
    /// Non-2xx is an error and `dest` is removed.
    fn download_to_file(
        &self,
        url: &str,
        dest: &Path,
        headers: &Headers,
        timeout: Duration,
    ) -> Result<u64, TransferError>;

    /// GET `url` following redirects. Any status is returned, not only 2xx.
    fn fetch_text(
        &self,
        url: &str,
        headers: &Headers,
        timeout: Duration,
    ) -> Result<TextResponse, TransferError>;

    /// HEAD `url` following redirects and return the final URL.
    fn resolve_head(
        &self,
        url: &str,
        headers: &Headers,
        timeout: Duration,
    ) -> Result<String, TransferError>;
}
