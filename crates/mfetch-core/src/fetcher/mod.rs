//! Executes one task: platform dispatch, the flaky-platform fallback loop,
//! and picking the produced file.
//!
//! Extraction and HTTP calls block, so each runs on tokio's blocking pool.
//! The caller awaits every call, so one task never has more than one
//! blocking call in flight.

mod html;
mod normalize;
mod plan;
mod select;
mod workspace;

pub use html::{download_from_page, extract_media_url, extract_video_page_url, unescape_media_url};
pub use normalize::resolve_flaky_url;
pub use plan::{build_attempt_plan, canonicalize_video_url, Attempt};
pub use select::select_output_file;
pub use workspace::{available_space, ensure_free_space, TaskWorkspace};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::classify::is_recoverable;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::extractor::{
    ExtractError, ExtractOptions, ExtractRequest, ExtractSettings, Extractor, RetrievalVariant,
    YtDlpExtractor,
};
use crate::http::{CurlHttp, HttpClient};
use crate::model::{MediaMode, Task};
use crate::platform::{detect_platform, Platform};
use crate::url_model::direct_filename;

/// Fetch-wide settings resolved once from the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    /// Timeout for direct transfers; also the extractor socket timeout.
    pub download_timeout: Duration,
    pub extract: ExtractSettings,
}

impl FetchSettings {
    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self {
            download_timeout: cfg.download_timeout(),
            extract: ExtractSettings::from_config(cfg),
        }
    }
}

#[derive(Clone)]
pub struct ContentFetcher {
    extractor: Arc<dyn Extractor>,
    http: Arc<dyn HttpClient>,
    settings: Arc<FetchSettings>,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Run `f` on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, FetchError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FetchError::Internal(format!("blocking call: {e}")))
}

impl ContentFetcher {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        http: Arc<dyn HttpClient>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            extractor,
            http,
            settings: Arc::new(settings),
        }
    }

    /// yt-dlp extractor and libcurl transfers configured from `cfg`.
    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self::new(
            Arc::new(YtDlpExtractor::from_config(&cfg.extractor())),
            Arc::new(CurlHttp::new()),
            FetchSettings::from_config(cfg),
        )
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Produce the task's media file inside `workspace`.
    pub async fn fetch(&self, task: &Task, workspace: &Path) -> Result<PathBuf, FetchError> {
        let platform = detect_platform(task.url());
        tracing::debug!(task_id = task.id(), platform = %platform, "dispatching fetch");
        match platform {
            Platform::Unknown => Err(FetchError::Unsupported(task.url().to_string())),
            Platform::Direct => self.fetch_direct(task, workspace).await,
            p if p.is_flaky() => self.fetch_flaky(task, workspace).await,
            _ => self.fetch_single(task, workspace).await,
        }
    }

    async fn fetch_direct(&self, task: &Task, workspace: &Path) -> Result<PathBuf, FetchError> {
        let dest = workspace.join(direct_filename(task.url(), task.mode(), unix_now()));
        let http = Arc::clone(&self.http);
        let url = task.url().to_string();
        let timeout = self.settings.download_timeout;

        let bytes = blocking({
            let dest = dest.clone();
            move || http.download_to_file(&url, &dest, &[], timeout)
        })
        .await??;
        tracing::debug!(task_id = task.id(), bytes, path = %dest.display(), "direct download done");
        Ok(dest)
    }

    async fn fetch_single(&self, task: &Task, workspace: &Path) -> Result<PathBuf, FetchError> {
        match self
            .extract(task.url(), RetrievalVariant::Web, task.mode(), workspace)
            .await?
        {
            Ok(Some(path)) => Ok(path),
            Ok(None) => Err(FetchError::NotFoundAfterExtraction),
            Err(e) => Err(FetchError::ExtractionFailed(e.to_string())),
        }
    }

    async fn fetch_flaky(&self, task: &Task, workspace: &Path) -> Result<PathBuf, FetchError> {
        let original = task.url().to_string();
        let url = blocking({
            let http = Arc::clone(&self.http);
            let original = original.clone();
            move || resolve_flaky_url(http.as_ref(), &original)
        })
        .await?
        .unwrap_or(original);

        let plan = build_attempt_plan(&url);
        let mut last_error: Option<String> = None;
        for (n, attempt) in plan.iter().enumerate() {
            match self
                .extract(&attempt.url, attempt.variant, task.mode(), workspace)
                .await?
            {
                Ok(Some(path)) => {
                    if n > 0 {
                        tracing::info!(
                            task_id = task.id(),
                            attempt = n + 1,
                            variant = attempt.variant.as_str(),
                            "TikTok fallback attempt succeeded"
                        );
                    }
                    return Ok(path);
                }
                Ok(None) => return Err(FetchError::NotFoundAfterExtraction),
                Err(e) => {
                    let message = e.to_string();
                    if !is_recoverable(&message) {
                        return Err(FetchError::ExtractionFailed(message));
                    }
                    tracing::warn!(
                        task_id = task.id(),
                        url = %attempt.url,
                        variant = attempt.variant.as_str(),
                        "TikTok attempt failed: {}",
                        message
                    );
                    last_error = Some(message);
                }
            }
        }

        if task.mode() == MediaMode::Video {
            let http = Arc::clone(&self.http);
            let dir = workspace.to_path_buf();
            let timeout = self.settings.download_timeout;
            let page_url = url.clone();
            let scraped = blocking(move || {
                download_from_page(http.as_ref(), &page_url, &dir, timeout, unix_now())
            })
            .await?;
            if let Some(path) = scraped {
                return Ok(path);
            }
        }

        Err(FetchError::ExtractionExhausted(last_error.unwrap_or_else(|| {
            format!("no extraction attempt succeeded for {url}")
        })))
    }

    /// One extractor run followed by output selection, both on the blocking pool.
    async fn extract(
        &self,
        url: &str,
        variant: RetrievalVariant,
        mode: MediaMode,
        workspace: &Path,
    ) -> Result<Result<Option<PathBuf>, ExtractError>, FetchError> {
        let request = ExtractRequest {
            url: url.to_string(),
            variant,
            output_dir: workspace.to_path_buf(),
            options: ExtractOptions::new(&self.settings.extract, workspace, mode, variant),
        };
        let extractor = Arc::clone(&self.extractor);
        blocking(move || -> Result<Option<PathBuf>, ExtractError> {
            extractor.extract(&request)?;
            Ok(select_output_file(&request.output_dir, mode)?)
        })
        .await
    }
}
