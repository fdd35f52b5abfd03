//! Failure classification.
//!
//! The extractor only reports failures as free-form text, so both decisions
//! made here are substring tables:
//! - whether a flaky-platform failure is worth trying the next fallback
//!   candidate for ([`is_recoverable`]);
//! - which user-facing category a terminal failure belongs to ([`categorize`]).

mod category;
mod recoverable;

pub use category::{categorize, truncate_diagnostic, FailureCategory, FailureReport, DIAGNOSTIC_LIMIT};
pub use recoverable::is_recoverable;
