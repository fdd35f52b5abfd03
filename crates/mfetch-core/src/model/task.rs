//! One unit of work: fetch this URL in this mode for this requester.

use std::time::{Duration, SystemTime};

use super::mode::MediaMode;
use super::status::{DownloadStatus, InvalidTransition};

/// Task identifier, assigned at admission in increasing order.
pub type TaskId = u64;

/// Account on whose behalf tasks are submitted (unit of quota accounting).
pub type RequesterId = i64;

#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    requester: RequesterId,
    url: String,
    mode: MediaMode,
    status: DownloadStatus,
    started_at: Option<SystemTime>,
    finished_at: Option<SystemTime>,
    error_message: Option<String>,
}

impl Task {
    pub fn new(id: TaskId, requester: RequesterId, url: impl Into<String>, mode: MediaMode) -> Self {
        Self {
            id,
            requester,
            url: url.into(),
            mode,
            status: DownloadStatus::Queued,
            started_at: None,
            finished_at: None,
            error_message: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn requester(&self) -> RequesterId {
        self.requester
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mode(&self) -> MediaMode {
        self.mode
    }

    pub fn status(&self) -> DownloadStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<SystemTime> {
        self.finished_at
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Wall time between start and finish, once both are known.
    pub fn elapsed(&self) -> Option<Duration> {
        let start = self.started_at?;
        self.finished_at?.duration_since(start).ok()
    }

    /// Move to `next`, stamping start/end times. Illegal moves leave the task untouched.
    pub fn transition(&mut self, next: DownloadStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        let now = SystemTime::now();
        match next {
            DownloadStatus::Downloading => self.started_at = Some(now),
            DownloadStatus::Completed | DownloadStatus::Failed => self.finished_at = Some(now),
            DownloadStatus::Queued | DownloadStatus::Sending => {}
        }
        self.status = next;
        Ok(())
    }

    /// Move to `Failed` and record the diagnostic.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), InvalidTransition> {
        self.transition(DownloadStatus::Failed)?;
        self.error_message = Some(message.into());
        Ok(())
    }
}
