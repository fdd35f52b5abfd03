//! CLI command handlers.

mod batch;
mod config;
mod detect;
mod get;
mod session;

pub use batch::run_batch;
pub use config::run_config;
pub use detect::run_detect;
pub use get::run_get;
