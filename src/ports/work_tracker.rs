//! Work Tracker Port - Interface for the external work-item data source.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::work::{WorkItemFilter, WorkItemRecord};

/// Errors surfaced by the tracker capability.
#[derive(Debug, Clone, Error)]
pub enum WorkTrackerError {
    /// The data source did not answer within the configured timeout.
    #[error("Tracker timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },

    /// The data source is temporarily unavailable.
    #[error("Tracker unavailable: {0}")]
    Unavailable(String),

    /// The data source rejected the filter expression.
    #[error("Tracker rejected the query: {0}")]
    Rejected(String),

    /// A returned record could not be decoded.
    #[error("Tracker returned a malformed record: {0}")]
    MalformedRecord(String),
}

impl WorkTrackerError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a rejected-query error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// Port for querying the external work-item data source.
///
/// Implementations translate the structured filter into the source's native
/// query language and decode results into typed records. Results must be
/// deterministic for identical filters against unchanged data.
#[async_trait]
pub trait WorkTracker: Send + Sync {
    /// Runs a structured query, returning matching records (possibly empty).
    async fn query_items(
        &self,
        filter: &WorkItemFilter,
    ) -> Result<Vec<WorkItemRecord>, WorkTrackerError>;
}
