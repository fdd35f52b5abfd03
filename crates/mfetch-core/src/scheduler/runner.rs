//! Runs one task end to end: workspace, fetch, size gate, delivery, status.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::fetcher::{ensure_free_space, ContentFetcher, TaskWorkspace};
use crate::model::{DownloadStatus, Task};

use super::delivery::Delivery;
use super::events::EventSink;
use super::queue::QueuedTask;

const MIB: u64 = 1024 * 1024;

/// Resource limits applied around every fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerLimits {
    pub max_file_size_bytes: u64,
    pub required_free_bytes: u64,
    pub temp_prefix: String,
    /// Parent of task workspaces; system temp dir when `None`.
    pub temp_root: Option<PathBuf>,
}

impl RunnerLimits {
    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self {
            max_file_size_bytes: cfg.max_file_size_bytes(),
            required_free_bytes: cfg.required_free_bytes(),
            temp_prefix: cfg.temp_dir_prefix.clone(),
            temp_root: None,
        }
    }
}

#[derive(Clone)]
pub struct TaskRunner {
    fetcher: ContentFetcher,
    delivery: Arc<dyn Delivery>,
    events: EventSink,
    limits: Arc<RunnerLimits>,
}

impl TaskRunner {
    pub fn new(
        fetcher: ContentFetcher,
        delivery: Arc<dyn Delivery>,
        events: EventSink,
        limits: RunnerLimits,
    ) -> Self {
        Self {
            fetcher,
            delivery,
            events,
            limits: Arc::new(limits),
        }
    }

    pub fn from_config(cfg: &FetchConfig, delivery: Arc<dyn Delivery>, events: EventSink) -> Self {
        Self::new(
            ContentFetcher::from_config(cfg),
            delivery,
            events,
            RunnerLimits::from_config(cfg),
        )
    }

    pub fn limits(&self) -> &RunnerLimits {
        &self.limits
    }

    /// Drive `task` from `Queued` to `Completed` or `Failed`. Never returns an
    /// error; failures end up in the returned task and the event stream.
    pub async fn run(&self, mut task: Task) -> Task {
        tracing::info!(
            task_id = task.id(),
            requester = task.requester(),
            url = %task.url(),
            mode = %task.mode(),
            "task started"
        );
        match self.execute(&mut task).await {
            Ok(()) => tracing::info!(
                task_id = task.id(),
                elapsed_ms = task.elapsed().map(|d| d.as_millis() as u64),
                "task completed"
            ),
            Err(err) => self.fail(&mut task, &err).await,
        }
        task
    }

    /// Resolve a task whose execution panicked. The original `Task` was lost
    /// with the panicking future, so it is rebuilt from the queue entry.
    pub async fn report_crash(&self, queued: &QueuedTask, detail: &str) -> Task {
        let mut task = queued.to_task();
        if let Err(e) = task.transition(DownloadStatus::Downloading) {
            tracing::error!(task_id = task.id(), "cannot mark crashed task started: {}", e);
        }
        let err = FetchError::Internal(format!("task panicked: {detail}"));
        self.fail(&mut task, &err).await;
        task
    }

    async fn execute(&self, task: &mut Task) -> Result<(), FetchError> {
        self.advance(task, DownloadStatus::Downloading).await?;

        let workspace = TaskWorkspace::create(
            &self.limits.temp_prefix,
            self.limits.temp_root.as_deref(),
        )
        .map_err(FetchError::Workspace)?;
        tracing::debug!(task_id = task.id(), path = %workspace.path().display(), "workspace created");

        let result = self.fetch_and_deliver(task, workspace.path()).await;

        if let Err(e) = workspace.close() {
            tracing::warn!(task_id = task.id(), error = %e, "failed to remove workspace");
        }
        result
    }

    async fn fetch_and_deliver(&self, task: &mut Task, dir: &Path) -> Result<(), FetchError> {
        ensure_free_space(dir, self.limits.required_free_bytes)?;

        let path = self.fetcher.fetch(task, dir).await?;
        let size = tokio::fs::metadata(&path)
            .await
            .map_err(|_| FetchError::NotFoundAfterExtraction)?
            .len();
        if size > self.limits.max_file_size_bytes {
            return Err(FetchError::SizeExceeded {
                size_mb: size.div_ceil(MIB),
                limit_mb: self.limits.max_file_size_bytes / MIB,
            });
        }

        self.advance(task, DownloadStatus::Sending).await?;
        self.delivery
            .deliver(task, &path)
            .await
            .map_err(|e| FetchError::Delivery(format!("{e:#}")))?;
        self.advance(task, DownloadStatus::Completed).await
    }

    async fn advance(&self, task: &mut Task, next: DownloadStatus) -> Result<(), FetchError> {
        task.transition(next)
            .map_err(|e| FetchError::Internal(e.to_string()))?;
        self.events.emit(task, None).await;
        Ok(())
    }

    async fn fail(&self, task: &mut Task, err: &FetchError) {
        let report = err.report();
        if report.category.is_expected() {
            tracing::warn!(
                task_id = task.id(),
                category = report.category.as_str(),
                "task failed: {}",
                report.diagnostic
            );
        } else {
            tracing::error!(
                task_id = task.id(),
                category = report.category.as_str(),
                "task failed: {}",
                report.diagnostic
            );
        }

        if let Err(e) = task.fail(report.diagnostic.clone()) {
            tracing::error!(task_id = task.id(), "cannot mark task failed: {}", e);
            return;
        }
        self.events.emit(task, Some(report)).await;
    }
}
