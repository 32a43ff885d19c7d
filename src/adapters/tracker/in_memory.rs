//! In-memory work tracker over fixture records.
//!
//! Filter semantics come from `WorkItemFilter::matches`, so this adapter
//! behaves exactly like a remote one would for the same data. Results are
//! sorted by item id to keep service output deterministic.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::work::{WorkItemFilter, WorkItemRecord};
use crate::ports::{WorkTracker, WorkTrackerError};

/// Fixture-backed tracker for tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryWorkTracker {
    items: RwLock<Vec<WorkItemRecord>>,
    fail_with: RwLock<Option<WorkTrackerError>>,
}

impl InMemoryWorkTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker seeded with records.
    pub fn with_items(items: Vec<WorkItemRecord>) -> Self {
        Self {
            items: RwLock::new(items),
            fail_with: RwLock::new(None),
        }
    }

    /// Adds a record.
    pub fn insert(&self, record: WorkItemRecord) {
        self.items.write().unwrap().push(record);
    }

    /// Makes every subsequent query fail with `error` (for resilience tests).
    pub fn fail_with(&self, error: WorkTrackerError) {
        *self.fail_with.write().unwrap() = Some(error);
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    /// Whether the tracker holds no records.
    pub fn is_empty(&self) -> bool {
        self.items.read().unwrap().is_empty()
    }
}

#[async_trait]
impl WorkTracker for InMemoryWorkTracker {
    async fn query_items(
        &self,
        filter: &WorkItemFilter,
    ) -> Result<Vec<WorkItemRecord>, WorkTrackerError> {
        if let Some(error) = self.fail_with.read().unwrap().clone() {
            return Err(error);
        }

        let mut matches: Vec<WorkItemRecord> = self
            .items
            .read()
            .unwrap()
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        matches.sort_by_key(|record| record.id);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::work::{ProjectRef, WorkItemKind, WorkItemState};
    use chrono::{TimeZone, Utc};

    fn record(id: u64, assignee: &str) -> WorkItemRecord {
        let at = Timestamp::from_datetime(Utc.with_ymd_and_hms(2025, 11, 5, 9, 0, 0).unwrap());
        WorkItemRecord {
            id,
            title: format!("Item {id}"),
            kind: WorkItemKind::Task,
            state: WorkItemState::Active,
            assignee: Some(assignee.to_string()),
            project: Some(ProjectRef::new("p-1", "Delta")),
            completed_hours: Some(2.0),
            estimated_hours: None,
            target_date: None,
            created_at: at,
            updated_at: at,
            tags: Vec::new(),
            parent_id: None,
        }
    }

    #[tokio::test]
    async fn results_are_filtered_and_sorted_by_id() {
        let tracker = InMemoryWorkTracker::with_items(vec![
            record(3, "Alice"),
            record(1, "Alice"),
            record(2, "Bob"),
        ]);

        let filter = WorkItemFilter::new().with_assignee("alice");
        let results = tracker.query_items(&filter).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn identical_queries_yield_identical_results() {
        let tracker = InMemoryWorkTracker::with_items(vec![record(1, "Alice"), record(2, "Bob")]);
        let filter = WorkItemFilter::new();
        let first = tracker.query_items(&filter).await.unwrap();
        let second = tracker.query_items(&filter).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn injected_failure_is_surfaced() {
        let tracker = InMemoryWorkTracker::new();
        tracker.fail_with(WorkTrackerError::unavailable("offline"));
        let err = tracker.query_items(&WorkItemFilter::new()).await.unwrap_err();
        assert!(matches!(err, WorkTrackerError::Unavailable(_)));
    }
}
