//! Fixed set of workers draining the task queue.

use std::any::Any;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::SubmitError;
use crate::model::{MediaMode, RequesterId, TaskId};
use crate::platform::{detect_platform, Platform};
use crate::quota::{QuotaTracker, RequesterLoad};

use super::guard::InFlight;
use super::queue::{QueueEntry, QueuedTask, TaskQueue};
use super::runner::TaskRunner;

pub struct WorkerPool {
    queue: TaskQueue,
    quota: Arc<QuotaTracker>,
    processing: Arc<AtomicUsize>,
    next_id: AtomicU64,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `worker_count` workers (minimum 1). The per-requester cap equals
    /// the worker count. Must be called inside a tokio runtime.
    pub fn start(runner: TaskRunner, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        Self::with_quota(runner, worker_count, Arc::new(QuotaTracker::new(worker_count)))
    }

    /// Like [`start`](Self::start) with a caller-supplied quota tracker.
    pub fn with_quota(runner: TaskRunner, worker_count: usize, quota: Arc<QuotaTracker>) -> Self {
        let queue = TaskQueue::new();
        let processing = Arc::new(AtomicUsize::new(0));
        let workers = (0..worker_count.max(1))
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    queue.clone(),
                    Arc::clone(&quota),
                    Arc::clone(&processing),
                    runner.clone(),
                ))
            })
            .collect();
        tracing::debug!(workers = worker_count, "worker pool started");
        Self {
            queue,
            quota,
            processing,
            next_id: AtomicU64::new(1),
            workers,
        }
    }

    /// Admit and enqueue a request. Unknown URLs are refused before the
    /// quota is consulted.
    pub fn submit(
        &self,
        requester: RequesterId,
        url: &str,
        mode: MediaMode,
    ) -> Result<TaskId, SubmitError> {
        let url = url.trim();
        if detect_platform(url) == Platform::Unknown {
            return Err(SubmitError::Unsupported(url.to_string()));
        }
        if !self.quota.try_admit(requester) {
            tracing::debug!(requester, limit = self.quota.limit(), "admission denied");
            return Err(SubmitError::QuotaExceeded {
                limit: self.quota.limit(),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let queued = QueuedTask {
            id,
            requester,
            url: url.to_string(),
            mode,
        };
        if self.queue.enqueue(queued).is_err() {
            self.quota.cancel_admission(requester);
            return Err(SubmitError::Closed);
        }
        tracing::debug!(task_id = id, requester, queue_len = self.queue.len(), "task queued");
        Ok(id)
    }

    /// Tasks admitted but not yet picked up.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Tasks currently running on a worker.
    pub fn processing_count(&self) -> usize {
        self.processing.load(Ordering::SeqCst)
    }

    pub fn requester_load(&self, requester: RequesterId) -> RequesterLoad {
        self.quota.load(requester)
    }

    pub fn quota(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop after the queue drains: one stop marker per worker goes behind
    /// everything already queued, then every worker is awaited.
    pub async fn shutdown(self) {
        tracing::debug!(queued = self.queue.len(), "worker pool shutting down");
        for _ in 0..self.workers.len() {
            self.queue.push_stop();
        }
        for handle in self.workers {
            if let Err(e) = handle.await {
                tracing::error!("worker exited abnormally: {}", e);
            }
        }
        tracing::debug!("worker pool stopped");
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: TaskQueue,
    quota: Arc<QuotaTracker>,
    processing: Arc<AtomicUsize>,
    runner: TaskRunner,
) {
    while let Some(QueueEntry::Task(queued)) = queue.dequeue().await {
        let _in_flight = InFlight::start(&quota, &processing, queued.requester, queued.id);

        let handle = tokio::spawn({
            let runner = runner.clone();
            let task = queued.to_task();
            async move { runner.run(task).await }
        });

        match handle.await {
            Ok(task) => tracing::debug!(
                worker_id,
                task_id = task.id(),
                status = task.status().as_str(),
                "worker finished task"
            ),
            Err(e) => {
                let detail = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                };
                tracing::error!(worker_id, task_id = queued.id, "task crashed: {}", detail);
                runner.report_crash(&queued, &detail).await;
            }
        }
    }
    tracing::debug!(worker_id, "worker stopped");
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
