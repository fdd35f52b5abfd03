//! Task queue and worker pool.
//!
//! Admission (quota check + id) happens in [`WorkerPool::submit`]; a fixed
//! set of workers drains one FIFO queue, running each task to completion
//! through [`TaskRunner`] before taking the next. Shutdown pushes one stop
//! marker per worker behind any queued tasks and waits for every worker.

mod delivery;
mod events;
mod guard;
mod pool;
mod queue;
mod runner;

pub use delivery::{CopyToDir, Delivery};
pub use events::{EventSink, TaskEvent};
pub use pool::WorkerPool;
pub use queue::{QueueClosed, QueuedTask, TaskQueue};
pub use runner::{RunnerLimits, TaskRunner};
