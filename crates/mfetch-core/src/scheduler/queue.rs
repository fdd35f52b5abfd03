//! Unbounded FIFO hand-off between admission and the workers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::model::{MediaMode, RequesterId, Task, TaskId};

/// An admitted request waiting for a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedTask {
    pub id: TaskId,
    pub requester: RequesterId,
    pub url: String,
    pub mode: MediaMode,
}

impl QueuedTask {
    pub fn to_task(&self) -> Task {
        Task::new(self.id, self.requester, self.url.clone(), self.mode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("task queue is closed")]
pub struct QueueClosed;

#[derive(Debug)]
pub(crate) enum QueueEntry {
    Task(QueuedTask),
    /// Tells the worker that pops it to exit.
    Stop,
}

/// Multi-consumer FIFO. Workers take turns on the receiver, so each entry
/// goes to exactly one worker in enqueue order.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<QueueEntry>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<QueueEntry>>>,
    pending: Arc<AtomicUsize>,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Append to the tail. Never blocks.
    pub fn enqueue(&self, task: QueuedTask) -> Result<(), QueueClosed> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.tx.send(QueueEntry::Task(task)).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            QueueClosed
        })
    }

    pub(crate) fn push_stop(&self) {
        let _ = self.tx.send(QueueEntry::Stop);
    }

    /// Wait for the next entry.
    pub(crate) async fn dequeue(&self) -> Option<QueueEntry> {
        let entry = self.rx.lock().await.recv().await;
        if let Some(QueueEntry::Task(_)) = entry {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
        entry
    }

    /// Tasks waiting for a worker (stop markers excluded).
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queued(id: TaskId) -> QueuedTask {
        QueuedTask {
            id,
            requester: 1,
            url: format!("https://youtu.be/{id}"),
            mode: MediaMode::Video,
        }
    }

    #[tokio::test]
    async fn fifo_order_and_len() {
        let q = TaskQueue::new();
        q.enqueue(queued(1)).unwrap();
        q.enqueue(queued(2)).unwrap();
        q.push_stop();
        assert_eq!(q.len(), 2);

        let Some(QueueEntry::Task(first)) = q.dequeue().await else {
            panic!("expected task");
        };
        assert_eq!(first.id, 1);
        let Some(QueueEntry::Task(second)) = q.dequeue().await else {
            panic!("expected task");
        };
        assert_eq!(second.id, 2);
        assert!(matches!(q.dequeue().await, Some(QueueEntry::Stop)));
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn clones_share_one_queue() {
        let producer = TaskQueue::new();
        let consumer = producer.clone();
        producer.enqueue(queued(7)).unwrap();
        assert_eq!(consumer.len(), 1);
        let Some(QueueEntry::Task(t)) = consumer.dequeue().await else {
            panic!("expected task");
        };
        assert_eq!(t.to_task().id(), 7);
        assert_eq!(producer.len(), 0);
    }
}
