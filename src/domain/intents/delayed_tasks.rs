//! Delayed-tasks intent: open items past their target date.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::TurnContext;
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
pub const CATEGORY: &str = "delayed_tasks";

const INSTRUCTIONS: &str = "Extract delayed-task query parameters from the user's message.\n\
Rules:\n\
1. person: extract an assignee name if one is mentioned.\n\
2. If a person appears in the previous context but not in the current query, reuse it.\n\
3. Use null when no person is mentioned.";

/// Parameters extracted for a delayed-tasks query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayedTasksParams {
    /// Restrict to one assignee.
    pub person: Option<String>,
}

impl IntentParams for DelayedTasksParams {}

/// LLM-backed extractor for delayed-task parameters.
pub struct DelayedTasksExtractor {
    language_model: Arc<dyn LanguageModel>,
}

impl DelayedTasksExtractor {
    /// Creates an extractor over the language-model capability.
    pub fn new(language_model: Arc<dyn LanguageModel>) -> Self {
        Self { language_model }
    }
}

#[async_trait]
impl ParamExtractor for DelayedTasksExtractor {
    type Params = DelayedTasksParams;

    async fn extract(
        &self,
        query: &str,
        ctx: &TurnContext,
    ) -> Result<DelayedTasksParams, HandlerError> {
        let value = self
            .language_model
            .extract(ExtractionRequest {
                query: query.to_string(),
                instructions: INSTRUCTIONS.to_string(),
                schema: ParameterSchema::new(
                    CATEGORY,
                    vec![FieldSpec::optional(
                        "person",
                        FieldKind::Text,
                        "Assignee name, if mentioned",
                    )],
                ),
                context: ctx.prompt_summary(),
                reference_date: ctx.reference_date,
            })
            .await?;

        let mut params: DelayedTasksParams = serde_json::from_value(value)
            .map_err(|e| LanguageModelError::schema_mismatch(e.to_string()))?;

        if params.person.is_none() {
            params.person = ctx
                .previous_param("person")
                .and_then(|v| v.as_str())
                .map(str::to_string);
        }

        Ok(params)
    }
}

/// One overdue item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayedItem {
    /// Tracker id.
    pub id: u64,
    /// Item title.
    pub title: String,
    /// Assignee display name, if assigned.
    pub assignee: Option<String>,
    /// The missed target date.
    pub target_date: NaiveDate,
    /// Whole days past the target date, as of the query.
    pub days_overdue: i64,
    /// Current state.
    pub state: WorkItemState,
}

/// Structured result of a delayed-tasks query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayedTasksResult {
    /// Overdue items, most overdue first.
    pub items: Vec<DelayedItem>,
    /// Total number of overdue items.
    pub total_count: usize,
    /// Date the delay was measured against.
    pub as_of: NaiveDate,
}

/// Tracker-backed service finding overdue open items.
pub struct DelayedTasksService {
    tracker: Arc<dyn WorkTracker>,
}

impl DelayedTasksService {
    /// Creates a service over the tracker capability.
    pub fn new(tracker: Arc<dyn WorkTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl IntentService for DelayedTasksService {
    type Params = DelayedTasksParams;
    type Output = DelayedTasksResult;

    async fn query(
        &self,
        params: &DelayedTasksParams,
        ctx: &TurnContext,
    ) -> Result<ServiceOutcome<DelayedTasksResult>, HandlerError> {
        let mut filter = WorkItemFilter::new()
            .open_only()
            .due_before(ctx.reference_date)
            .with_kind(WorkItemKind::Task)
            .with_kind(WorkItemKind::Bug)
            .with_kind(WorkItemKind::Story);
        if let Some(person) = &params.person {
            filter = filter.with_assignee(person.clone());
        }
        if let Some(project) = &ctx.selected_project {
            filter = filter.with_project(project.id.clone());
        }

        let records = self.tracker.query_items(&filter).await?;

        let mut items: Vec<DelayedItem> = records
            .iter()
            .filter_map(|record| {
                let target_date = record.target_date?;
                Some(DelayedItem {
                    id: record.id,
                    title: record.title.clone(),
                    assignee: record.assignee.clone(),
                    target_date,
                    days_overdue: (ctx.reference_date - target_date).num_days(),
                    state: record.state,
                })
            })
            .collect();
        items.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue).then(a.id.cmp(&b.id)));

        Ok(ServiceOutcome::new(DelayedTasksResult {
            total_count: items.len(),
            items,
            as_of: ctx.reference_date,
        }))
    }
}

/// Metadata for registry bootstrap.
pub fn metadata() -> IntentMetadata {
    IntentMetadata::new(
        CATEGORY,
        "Delayed Tasks",
        "Questions about overdue, late, or at-risk tasks and missed deadlines",
        Arc::new(|deps: &HandlerDeps| {
            Arc::new(IntentPipeline::new(
                CATEGORY,
                DelayedTasksExtractor::new(deps.language_model.clone()),
                DelayedTasksService::new(deps.tracker.clone()),
            ))
        }),
    )
    .with_agent_name("tasks_agent")
    .with_llm_finish()
}
