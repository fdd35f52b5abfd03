//! RAII guard for a task a worker has picked up.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::model::{RequesterId, TaskId};
use crate::quota::QuotaTracker;

/// Holds the requester's active slot and the pool's busy count for one task.
/// Both are released when dropped, whatever way the task ended.
pub(super) struct InFlight<'a> {
    quota: &'a QuotaTracker,
    processing: &'a AtomicUsize,
    requester: RequesterId,
    task_id: TaskId,
}

impl<'a> InFlight<'a> {
    pub(super) fn start(
        quota: &'a QuotaTracker,
        processing: &'a AtomicUsize,
        requester: RequesterId,
        task_id: TaskId,
    ) -> Self {
        quota.mark_started(requester, task_id);
        processing.fetch_add(1, Ordering::SeqCst);
        Self {
            quota,
            processing,
            requester,
            task_id,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.processing.fetch_sub(1, Ordering::SeqCst);
        self.quota.mark_finished(self.requester, self.task_id);
    }
}
