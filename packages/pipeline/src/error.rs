//! Typed errors for the pipeline library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use std::time::Duration;
use thiserror::Error;

/// Errors produced while extracting records from a job source.
///
/// Variants are cloneable so an error observed mid-stream can be
/// carried into the per-config outcome report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// The source refused the request (HTTP 403/429 or a captcha page).
    #[error("source blocked the request: {0}")]
    Blocked(String),

    /// The page downloaded but its markup no longer matches the
    /// selectors this source expects.
    #[error("page layout mismatch: {0}")]
    LayoutMismatch(String),

    /// Transport-level failure (DNS, connect, non-success status).
    #[error("network error: {0}")]
    Network(String),

    /// A single fetch exceeded its deadline.
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl ExtractError {
    /// Whether retrying the same page later could plausibly succeed.
    /// Blocked and layout errors persist for the rest of a run.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

/// Errors produced by the storage layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The backing store could not be reached or the operation
    /// exceeded its deadline.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The write violated a schema constraint other than the
    /// dedup uniqueness (which is absorbed by upsert).
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Errors that abort an entire pipeline run.
///
/// Per-config failures are isolated into outcome reports and never
/// surface here; only the inability to learn what work exists does.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Active search configs could not be fetched.
    #[error("failed to fetch search configs: {0}")]
    ConfigFetch(#[source] StorageError),
}

/// Result type alias for extraction operations.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result type alias for pipeline runs.
pub type Result<T> = std::result::Result<T, PipelineError>;
