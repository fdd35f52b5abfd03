//! Task identity and lifecycle.
//!
//! A `Task` is created by the worker that dequeues it and never leaves that
//! worker; other components only see its ids and the events it emits.

mod mode;
mod status;
mod task;

pub use mode::{MediaMode, ParseModeError};
pub use status::{DownloadStatus, InvalidTransition};
pub use task::{RequesterId, Task, TaskId};
