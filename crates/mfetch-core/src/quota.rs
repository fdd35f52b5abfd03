//! Per-requester admission control.
//!
//! A requester may have at most `limit` tasks that are either waiting in the
//! queue or running. A task holds a queued slot from admission until a worker
//! picks it up, then an active slot until it finishes, so the cap holds across
//! both phases. All state sits behind one mutex, which makes `try_admit`,
//! `mark_started` and `mark_finished` linearizable with respect to each other.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::model::{RequesterId, TaskId};

#[derive(Debug, Default)]
struct Slots {
    queued: usize,
    active: BTreeSet<TaskId>,
}

impl Slots {
    fn total(&self) -> usize {
        self.queued + self.active.len()
    }
}

/// Snapshot of one requester's usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequesterLoad {
    pub queued: usize,
    pub active: usize,
}

impl RequesterLoad {
    pub fn total(&self) -> usize {
        self.queued + self.active
    }
}

#[derive(Debug)]
pub struct QuotaTracker {
    limit: usize,
    slots: Mutex<HashMap<RequesterId, Slots>>,
}

impl QuotaTracker {
    /// Tracker allowing `limit` queued + running tasks per requester (minimum 1).
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned mutex is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<RequesterId, Slots>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve a queued slot. Returns false when the requester is at the cap.
    pub fn try_admit(&self, requester: RequesterId) -> bool {
        let mut slots = self.lock();
        let entry = slots.entry(requester).or_default();
        if entry.total() >= self.limit {
            return false;
        }
        entry.queued += 1;
        true
    }

    /// Give back a queued slot whose task never reached the queue.
    pub fn cancel_admission(&self, requester: RequesterId) {
        let mut slots = self.lock();
        let Some(entry) = slots.get_mut(&requester) else {
            return;
        };
        entry.queued = entry.queued.saturating_sub(1);
        if entry.total() == 0 {
            slots.remove(&requester);
        }
    }

    /// Move one queued slot to the active set under `task_id`.
    pub fn mark_started(&self, requester: RequesterId, task_id: TaskId) {
        let mut slots = self.lock();
        let entry = slots.entry(requester).or_default();
        entry.queued = entry.queued.saturating_sub(1);
        entry.active.insert(task_id);
    }

    /// Release the active slot held by `task_id`; forgets the requester once idle.
    pub fn mark_finished(&self, requester: RequesterId, task_id: TaskId) {
        let mut slots = self.lock();
        let Some(entry) = slots.get_mut(&requester) else {
            return;
        };
        entry.active.remove(&task_id);
        if entry.total() == 0 {
            slots.remove(&requester);
        }
    }

    pub fn load(&self, requester: RequesterId) -> RequesterLoad {
        self.lock()
            .get(&requester)
            .map(|s| RequesterLoad {
                queued: s.queued,
                active: s.active.len(),
            })
            .unwrap_or_default()
    }

    /// Ids of the requester's running tasks, ascending.
    pub fn active_tasks(&self, requester: RequesterId) -> Vec<TaskId> {
        self.lock()
            .get(&requester)
            .map(|s| s.active.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of requesters with at least one queued or running task.
    pub fn tracked_requesters(&self) -> usize {
        self.lock().len()
    }
}
