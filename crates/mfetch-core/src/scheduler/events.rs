//! Status updates sent to the front end.

use tokio::sync::mpsc;

use crate::classify::FailureReport;
use crate::model::{DownloadStatus, RequesterId, Task, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEvent {
    pub task_id: TaskId,
    pub requester: RequesterId,
    pub status: DownloadStatus,
    /// Set only for `Failed`.
    pub failure: Option<FailureReport>,
}

/// Optional event channel. A dropped receiver is ignored.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<TaskEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<TaskEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Send the task's current status.
    pub async fn emit(&self, task: &Task, failure: Option<FailureReport>) {
        let Some(tx) = &self.tx else {
            return;
        };
        let event = TaskEvent {
            task_id: task.id(),
            requester: task.requester(),
            status: task.status(),
            failure,
        };
        if tx.send(event).await.is_err() {
            tracing::debug!(task_id = task.id(), "event receiver dropped");
        }
    }
}
