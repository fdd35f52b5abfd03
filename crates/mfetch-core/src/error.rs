//! Task-level error types.

use crate::classify::{categorize, FailureCategory, FailureReport};
use crate::http::TransferError;

/// Terminal failure of one task.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("not enough disk space: {available_mb} MiB free, {required_mb} MiB required")]
    InsufficientDisk { available_mb: u64, required_mb: u64 },
    #[error("workspace: {0}")]
    Workspace(#[source] std::io::Error),
    #[error("no output file found after extraction")]
    NotFoundAfterExtraction,
    #[error("file too large: {size_mb} MiB exceeds the {limit_mb} MiB limit")]
    SizeExceeded { size_mb: u64, limit_mb: u64 },
    /// Extractor failure that is not worth retrying.
    #[error("{0}")]
    ExtractionFailed(String),
    /// Every fallback candidate failed; carries the last error.
    #[error("{0}")]
    ExtractionExhausted(String),
    #[error("transfer failed: {0}")]
    Transport(#[from] TransferError),
    #[error("unsupported URL: {0}")]
    Unsupported(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl FetchError {
    /// Variants with a fixed meaning map directly; the rest go through the text table.
    pub fn category(&self) -> FailureCategory {
        match self {
            FetchError::SizeExceeded { .. } => FailureCategory::TooLarge,
            FetchError::InsufficientDisk { .. } => FailureCategory::DiskSpace,
            FetchError::Unsupported(_) => FailureCategory::Unsupported,
            // The "workspace:" prefix would match the disk-space rule.
            FetchError::Workspace(e) => categorize(&e.to_string()),
            other => categorize(&other.to_string()),
        }
    }

    pub fn report(&self) -> FailureReport {
        FailureReport::new(self.category(), &self.to_string())
    }
}

/// Request refused before it was queued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("too many downloads in progress (limit {limit})")]
    QuotaExceeded { limit: usize },
    #[error("unsupported URL: {0}")]
    Unsupported(String),
    #[error("worker pool is shut down")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_variants_map_directly() {
        let e = FetchError::SizeExceeded {
            size_mb: 3000,
            limit_mb: 2048,
        };
        assert_eq!(e.category(), FailureCategory::TooLarge);
        let e = FetchError::InsufficientDisk {
            available_mb: 10,
            required_mb: 500,
        };
        assert_eq!(e.category(), FailureCategory::DiskSpace);
        assert_eq!(
            FetchError::Unsupported("https://dropbox.com/x".into()).category(),
            FailureCategory::Unsupported
        );
    }

    #[test]
    fn text_variants_use_rule_table() {
        let e = FetchError::ExtractionExhausted(
            "ERROR: [TikTok] 1: Unable to extract webpage video data".into(),
        );
        assert_eq!(e.category(), FailureCategory::ExtractorOutage);
        let e = FetchError::ExtractionFailed("ERROR: Private video".into());
        assert_eq!(e.category(), FailureCategory::Unavailable);
        assert_eq!(
            FetchError::NotFoundAfterExtraction.category(),
            FailureCategory::Generic
        );
        let e = FetchError::Workspace(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        ));
        assert_eq!(e.category(), FailureCategory::Generic);
    }

    #[test]
    fn report_truncates_diagnostic() {
        let e = FetchError::ExtractionFailed("x".repeat(1000));
        let report = e.report();
        assert_eq!(report.diagnostic.chars().count(), 350);
        assert_eq!(report.category, FailureCategory::Generic);
    }
}
