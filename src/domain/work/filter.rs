//! Structured filter expression for tracker queries.
//!
//! Services never hand raw text to the data source; they build a
//! `WorkItemFilter` and let the tracker adapter translate it. Match semantics
//! live here so every adapter filters identically.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DateRange;

use super::{WorkItemKind, WorkItemRecord, WorkItemState};

/// Structured query expression accepted by the tracker capability.
///
/// All clauses are conjunctive; an empty filter matches every item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkItemFilter {
    /// Restrict to a project id.
    pub project_id: Option<String>,
    /// Case-insensitive substring match on the assignee display name.
    pub assignee_contains: Option<String>,
    /// Restrict to any of these states (empty = all states).
    pub states: Vec<WorkItemState>,
    /// Restrict to any of these kinds (empty = all kinds).
    pub kinds: Vec<WorkItemKind>,
    /// Items last updated within this range.
    pub updated_within: Option<DateRange>,
    /// Items due strictly before this date.
    pub due_before: Option<NaiveDate>,
    /// Items carrying all of these tags.
    pub tags: Vec<String>,
}

impl WorkItemFilter {
    /// Creates an empty filter matching everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to a project id.
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Restricts to assignees whose display name contains `fragment`.
    pub fn with_assignee(mut self, fragment: impl Into<String>) -> Self {
        self.assignee_contains = Some(fragment.into());
        self
    }

    /// Adds a state clause.
    pub fn with_state(mut self, state: WorkItemState) -> Self {
        self.states.push(state);
        self
    }

    /// Restricts to open states (new, active, in progress).
    pub fn open_only(mut self) -> Self {
        self.states = vec![
            WorkItemState::New,
            WorkItemState::Active,
            WorkItemState::InProgress,
        ];
        self
    }

    /// Adds a kind clause.
    pub fn with_kind(mut self, kind: WorkItemKind) -> Self {
        self.kinds.push(kind);
        self
    }

    /// Restricts to items updated within `range`.
    pub fn updated_within(mut self, range: DateRange) -> Self {
        self.updated_within = Some(range);
        self
    }

    /// Restricts to items due strictly before `date`.
    pub fn due_before(mut self, date: NaiveDate) -> Self {
        self.due_before = Some(date);
        self
    }

    /// Adds a required tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Whether `record` satisfies every clause of this filter.
    pub fn matches(&self, record: &WorkItemRecord) -> bool {
        if let Some(project_id) = &self.project_id {
            match &record.project {
                Some(project) if &project.id == project_id => {}
                _ => return false,
            }
        }

        if let Some(fragment) = &self.assignee_contains {
            match &record.assignee {
                Some(name) if name.to_lowercase().contains(&fragment.to_lowercase()) => {}
                _ => return false,
            }
        }

        if !self.states.is_empty() && !self.states.contains(&record.state) {
            return false;
        }

        if !self.kinds.is_empty() && !self.kinds.contains(&record.kind) {
            return false;
        }

        if let Some(range) = &self.updated_within {
            if !range.contains(record.updated_at.date()) {
                return false;
            }
        }

        if let Some(cutoff) = self.due_before {
            match record.target_date {
                Some(due) if due < cutoff => {}
                _ => return false,
            }
        }

        self.tags
            .iter()
            .all(|tag| record.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use chrono::{TimeZone, Utc};

    fn record(id: u64) -> WorkItemRecord {
        let at = Timestamp::from_datetime(Utc.with_ymd_and_hms(2025, 11, 5, 9, 0, 0).unwrap());
        WorkItemRecord {
            id,
            title: format!("Item {id}"),
            kind: WorkItemKind::Task,
            state: WorkItemState::Active,
            assignee: Some("Alice Martins".to_string()),
            project: Some(crate::domain::work::ProjectRef::new("p-1", "Delta")),
            completed_hours: Some(3.0),
            estimated_hours: None,
            target_date: NaiveDate::from_ymd_opt(2025, 11, 1),
            created_at: at,
            updated_at: at,
            tags: vec!["backend".to_string()],
            parent_id: None,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(WorkItemFilter::new().matches(&record(1)));
    }

    #[test]
    fn assignee_match_is_case_insensitive_substring() {
        let filter = WorkItemFilter::new().with_assignee("alice");
        assert!(filter.matches(&record(1)));

        let filter = WorkItemFilter::new().with_assignee("bob");
        assert!(!filter.matches(&record(1)));
    }

    #[test]
    fn project_clause_requires_exact_id() {
        assert!(WorkItemFilter::new().with_project("p-1").matches(&record(1)));
        assert!(!WorkItemFilter::new().with_project("p-2").matches(&record(1)));
    }

    #[test]
    fn due_before_excludes_items_without_target_date() {
        let mut item = record(1);
        item.target_date = None;
        let filter = WorkItemFilter::new().due_before(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert!(!filter.matches(&item));
    }

    #[test]
    fn updated_within_respects_range() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 9).unwrap(),
        )
        .unwrap();
        assert!(WorkItemFilter::new().updated_within(range).matches(&record(1)));

        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
        )
        .unwrap();
        assert!(!WorkItemFilter::new().updated_within(range).matches(&record(1)));
    }

    #[test]
    fn tag_clauses_are_conjunctive() {
        let filter = WorkItemFilter::new().with_tag("backend");
        assert!(filter.matches(&record(1)));

        let filter = WorkItemFilter::new().with_tag("backend").with_tag("urgent");
        assert!(!filter.matches(&record(1)));
    }
}
