//! Work-item records as returned by the tracker capability.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Timestamp;

/// Reference to a project (the tracker models projects as top-level items).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    /// Stable project identifier.
    pub id: String,
    /// Human-readable project name.
    pub name: String,
}

impl ProjectRef {
    /// Creates a project reference.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Kind of work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemKind {
    Epic,
    Feature,
    Story,
    Task,
    Bug,
}

/// Lifecycle state of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemState {
    New,
    Active,
    InProgress,
    Resolved,
    Closed,
    Removed,
}

impl WorkItemState {
    /// Whether the item still represents pending work.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            WorkItemState::New | WorkItemState::Active | WorkItemState::InProgress
        )
    }
}

/// A single typed record from the tracker capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemRecord {
    /// Tracker-assigned identifier.
    pub id: u64,
    /// Item title.
    pub title: String,
    /// Item kind.
    pub kind: WorkItemKind,
    /// Current state.
    pub state: WorkItemState,
    /// Display name of the assignee, if any.
    pub assignee: Option<String>,
    /// Project the item belongs to, if any.
    pub project: Option<ProjectRef>,
    /// Hours logged against the item; absent means none recorded.
    pub completed_hours: Option<f64>,
    /// Estimated hours, if planned.
    pub estimated_hours: Option<f64>,
    /// Due date, if one was set.
    pub target_date: Option<NaiveDate>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    pub updated_at: Timestamp,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Parent item id for hierarchy queries.
    pub parent_id: Option<u64>,
}

impl WorkItemRecord {
    /// Hours logged, treating an absent field as zero.
    pub fn logged_hours(&self) -> f64 {
        self.completed_hours.unwrap_or(0.0)
    }
}
