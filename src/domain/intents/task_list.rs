//! Task-list intent: which work items match a set of filters.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::TurnContext;
use crate::domain::foundation::DateRange;
use crate::domain::work::{WorkItemFilter, WorkItemKind, WorkItemState};
use crate::ports::{
    ExtractionRequest, FieldKind, FieldSpec, LanguageModel, LanguageModelError, ParameterSchema,
    WorkTracker,
};

use super::pipeline::{
    HandlerError, IntentParams, IntentPipeline, IntentService, ParamExtractor, ServiceOutcome,
};
use super::registry::{HandlerDeps, IntentMetadata};

/// Registry identifier for this intent.
pub const CATEGORY: &str = "task_list";

/// Example prompts for classification testing.
pub fn examples() -> &'static [&'static str] {
    &[
        "minhas tarefas ativas",
        "tasks do Joao em progresso",
        "bugs assigned to Maria",
        "user stories completed this week",
        "tarefas com tag urgent",
    ]
}

const INSTRUCTIONS: &str = "Extract task-listing parameters from the user's message.\n\
Rules:\n\
1. person: extract a single assignee name if exactly one person is mentioned.\n\
2. state/kind: map wording like \"in progress\", \"done\", \"bug\" onto the allowed values.\n\
3. Convert relative periods into concrete dates using the reference date.\n\
4. tags: extract mentioned tags as a list.\n\
5. Use null (or an empty list) for anything not mentioned.";

/// Parameters extracted for a task-list query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListParams {
    /// Assignee filter.
    pub person: Option<String>,
    /// State filter.
    pub state: Option<WorkItemState>,
    /// Kind filter; defaults to tasks when unspecified.
    pub kind: Option<WorkItemKind>,
    /// Period start for last-update filtering.
    pub start_date: Option<NaiveDate>,
    /// Period end for last-update filtering.
    pub end_date: Option<NaiveDate>,
    /// Required tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl IntentParams for TaskListParams {}

/// LLM-backed extractor for task-list parameters.
pub struct TaskListExtractor {
    language_model: Arc<dyn LanguageModel>,
}

impl TaskListExtractor {
    /// Creates an extractor over the language-model capability.
    pub fn new(language_model: Arc<dyn LanguageModel>) -> Self {
        Self { language_model }
    }

    fn schema() -> ParameterSchema {
        ParameterSchema::new(
            CATEGORY,
            vec![
                FieldSpec::optional("person", FieldKind::Text, "Assignee name, if exactly one is mentioned"),
                FieldSpec::optional(
                    "state",
                    FieldKind::OneOf(vec![
                        "new".into(),
                        "active".into(),
                        "in_progress".into(),
                        "resolved".into(),
                        "closed".into(),
                    ]),
                    "State filter",
                ),
                FieldSpec::optional(
                    "kind",
                    FieldKind::OneOf(vec![
                        "task".into(),
                        "bug".into(),
                        "story".into(),
                        "feature".into(),
                        "epic".into(),
                    ]),
                    "Work-item kind filter",
                ),
                FieldSpec::optional("start_date", FieldKind::Date, "Period start, if mentioned"),
                FieldSpec::optional("end_date", FieldKind::Date, "Period end, if mentioned"),
                FieldSpec::optional("tags", FieldKind::TextList, "Tags to filter by"),
            ],
        )
    }
}

#[async_trait]
impl ParamExtractor for TaskListExtractor {
    type Params = TaskListParams;

    async fn extract(&self, query: &str, ctx: &TurnContext) -> Result<TaskListParams, HandlerError> {
        let value = self
            .language_model
            .extract(ExtractionRequest {
                query: query.to_string(),
                instructions: INSTRUCTIONS.to_string(),
                schema: Self::schema(),
                context: ctx.prompt_summary(),
                reference_date: ctx.reference_date,
            })
            .await?;

        let mut params: TaskListParams = serde_json::from_value(value)
            .map_err(|e| LanguageModelError::schema_mismatch(e.to_string()))?;

        if params.person.is_none() {
            params.person = ctx
                .previous_param("person")
                .and_then(|v| v.as_str())
                .map(str::to_string);
        }

        // A single mentioned date means a single-day window.
        match (params.start_date, params.end_date) {
            (Some(start), Some(end)) if start > end => {
                params.start_date = Some(end);
                params.end_date = Some(start);
            }
            (Some(start), None) => params.end_date = Some(start),
            (None, Some(end)) => params.start_date = Some(end),
            _ => {}
        }

        Ok(params)
    }
}

/// Compact listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Tracker id.
    pub id: u64,
    /// Task title.
    pub title: String,
    /// Item kind.
    pub kind: WorkItemKind,
    /// Current state.
    pub state: WorkItemState,
    /// Assignee display name, if assigned.
    pub assignee: Option<String>,
}

/// Structured result of a task-list query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskListResult {
    /// Matching items, sorted by id.
    pub tasks: Vec<TaskSummary>,
    /// Total number of matches.
    pub total_count: usize,
    /// Task titles grouped by assignee.
    pub tasks_by_assignee: BTreeMap<String, Vec<String>>,
    /// Match counts per assignee.
    pub count_by_assignee: BTreeMap<String, usize>,
    /// The filter that produced the listing.
    pub filtered_by: WorkItemFilter,
}

const UNASSIGNED: &str = "Unassigned";

/// Tracker-backed service listing matching work items.
pub struct TaskListService {
    tracker: Arc<dyn WorkTracker>,
}

impl TaskListService {
    /// Creates a service over the tracker capability.
    pub fn new(tracker: Arc<dyn WorkTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl IntentService for TaskListService {
    type Params = TaskListParams;
    type Output = TaskListResult;

    async fn query(
        &self,
        params: &TaskListParams,
        ctx: &TurnContext,
    ) -> Result<ServiceOutcome<TaskListResult>, HandlerError> {
        let mut filter =
            WorkItemFilter::new().with_kind(params.kind.unwrap_or(WorkItemKind::Task));
        if let Some(person) = &params.person {
            filter = filter.with_assignee(person.clone());
        }
        if let Some(state) = params.state {
            filter = filter.with_state(state);
        }
        if let (Some(start), Some(end)) = (params.start_date, params.end_date) {
            let range = DateRange::new(start, end)
                .map_err(|e| HandlerError::Unexpected(format!("unnormalized range: {e}")))?;
            filter = filter.updated_within(range);
        }
        for tag in &params.tags {
            filter = filter.with_tag(tag.clone());
        }
        if let Some(project) = &ctx.selected_project {
            filter = filter.with_project(project.id.clone());
        }

        let records = self.tracker.query_items(&filter).await?;

        let mut tasks_by_assignee: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut count_by_assignee: BTreeMap<String, usize> = BTreeMap::new();
        let tasks: Vec<TaskSummary> = records
            .iter()
            .map(|record| {
                let owner = record.assignee.clone().unwrap_or_else(|| UNASSIGNED.to_string());
                tasks_by_assignee
                    .entry(owner.clone())
                    .or_default()
                    .push(record.title.clone());
                *count_by_assignee.entry(owner).or_default() += 1;

                TaskSummary {
                    id: record.id,
                    title: record.title.clone(),
                    kind: record.kind,
                    state: record.state,
                    assignee: record.assignee.clone(),
                }
            })
            .collect();

        Ok(ServiceOutcome::new(TaskListResult {
            total_count: tasks.len(),
            tasks,
            tasks_by_assignee,
            count_by_assignee,
            filtered_by: filter,
        }))
    }
}

/// Metadata for registry bootstrap.
pub fn metadata() -> IntentMetadata {
    IntentMetadata::new(
        CATEGORY,
        "Task Listing",
        "Questions listing tasks, bugs, or stories, optionally filtered by person, state, period, or tag",
        Arc::new(|deps: &HandlerDeps| {
            Arc::new(IntentPipeline::new(
                CATEGORY,
                TaskListExtractor::new(deps.language_model.clone()),
                TaskListService::new(deps.tracker.clone()),
            ))
        }),
    )
    .with_agent_name("tasks_agent")
    .with_llm_finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tracker::InMemoryWorkTracker;
    use crate::domain::foundation::{ConversationId, Timestamp};
    use crate::domain::work::{ProjectRef, WorkItemRecord};
    use chrono::{TimeZone, Utc};

    fn context() -> TurnContext {
        TurnContext {
            conversation_id: ConversationId::new(),
            reference_date: NaiveDate::from_ymd_opt(2025, 11, 7).unwrap(),
            selected_project: None,
            previous: None,
            recent: Vec::new(),
            carry_over: None,
        }
    }

    fn record(id: u64, kind: WorkItemKind, assignee: Option<&str>) -> WorkItemRecord {
        let at = Timestamp::from_datetime(Utc.with_ymd_and_hms(2025, 11, 5, 9, 0, 0).unwrap());
        WorkItemRecord {
            id,
            title: format!("Item {id}"),
            kind,
            state: WorkItemState::Active,
            assignee: assignee.map(str::to_string),
            project: Some(ProjectRef::new("p-1", "Delta")),
            completed_hours: None,
            estimated_hours: None,
            target_date: None,
            created_at: at,
            updated_at: at,
            tags: Vec::new(),
            parent_id: None,
        }
    }

    fn empty_params() -> TaskListParams {
        TaskListParams {
            person: None,
            state: None,
            kind: None,
            start_date: None,
            end_date: None,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn defaults_to_listing_tasks_only() {
        let tracker = Arc::new(InMemoryWorkTracker::with_items(vec![
            record(1, WorkItemKind::Task, Some("Alice")),
            record(2, WorkItemKind::Epic, None),
            record(3, WorkItemKind::Task, Some("Bob")),
        ]));
        let service = TaskListService::new(tracker);

        let outcome = service.query(&empty_params(), &context()).await.unwrap();
        assert_eq!(outcome.output.total_count, 2);
        let ids: Vec<_> = outcome.output.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn groups_by_assignee_with_unassigned_bucket() {
        let tracker = Arc::new(InMemoryWorkTracker::with_items(vec![
            record(1, WorkItemKind::Task, Some("Alice")),
            record(2, WorkItemKind::Task, Some("Alice")),
            record(3, WorkItemKind::Task, None),
        ]));
        let service = TaskListService::new(tracker);

        let outcome = service.query(&empty_params(), &context()).await.unwrap();
        assert_eq!(outcome.output.count_by_assignee["Alice"], 2);
        assert_eq!(outcome.output.count_by_assignee[UNASSIGNED], 1);
        assert_eq!(outcome.output.tasks_by_assignee["Alice"].len(), 2);
    }

    #[tokio::test]
    async fn explicit_kind_overrides_the_task_default() {
        let tracker = Arc::new(InMemoryWorkTracker::with_items(vec![
            record(1, WorkItemKind::Task, Some("Alice")),
            record(2, WorkItemKind::Bug, Some("Alice")),
        ]));
        let service = TaskListService::new(tracker);

        let params = TaskListParams {
            kind: Some(WorkItemKind::Bug),
            ..empty_params()
        };
        let outcome = service.query(&params, &context()).await.unwrap();
        assert_eq!(outcome.output.total_count, 1);
        assert_eq!(outcome.output.tasks[0].kind, WorkItemKind::Bug);
    }
}
