//! Worked-hours intent: how much time someone logged over a period.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::TurnContext;
use crate::domain::foundation::DateRange;
use crate::domain::work::{WorkItemFilter, WorkItemState};
use crate::ports::{
    ExtractionRequest, FieldKind, FieldSpec, LanguageModel, LanguageModelError, ParameterSchema,
    WorkTracker,
};

use super::pipeline::{
    HandlerError, IntentParams, IntentPipeline, IntentService, ParamExtractor, ServiceOutcome,
};
use super::registry::{HandlerDeps, IntentMetadata};

/// Registry identifier for this intent.
pub const CATEGORY: &str = "worked_hours";

/// Example prompts for classification testing.
pub fn examples() -> &'static [&'static str] {
    &[
        "Quantas horas trabalhou Alice esta semana?",
        "How many hours did Bob log last month?",
        "Total time spent on tasks this week",
        "Horas previstas e trabalhadas da equipe em outubro",
    ]
}

const INSTRUCTIONS: &str = "Extract worked-hours query parameters from the user's message.\n\
Rules:\n\
1. Convert relative periods (\"this week\", \"last month\") into concrete start and end dates \
using the reference date.\n\
2. If only a period is mentioned, fill in both the start and the end date.\n\
3. If a person appears in the previous context but not in the current query, reuse it.\n\
4. Use null for anything that cannot be determined.";

/// Parameters extracted for a worked-hours query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkedHoursParams {
    /// Person whose hours are being asked about; `None` means everyone.
    pub person: Option<String>,
    /// Start of the period (inclusive).
    pub start_date: Option<NaiveDate>,
    /// End of the period (inclusive).
    pub end_date: Option<NaiveDate>,
    /// Project explicitly named in the query.
    pub project: Option<String>,
}

impl IntentParams for WorkedHoursParams {
    fn explicit_project(&self) -> Option<&str> {
        self.project.as_deref()
    }
}

/// LLM-backed extractor for worked-hours parameters.
pub struct WorkedHoursExtractor {
    language_model: Arc<dyn LanguageModel>,
}

impl WorkedHoursExtractor {
    /// Creates an extractor over the language-model capability.
    pub fn new(language_model: Arc<dyn LanguageModel>) -> Self {
        Self { language_model }
    }

    fn schema() -> ParameterSchema {
        ParameterSchema::new(
            CATEGORY,
            vec![
                FieldSpec::optional("person", FieldKind::Text, "Name of the person or team member"),
                FieldSpec::optional("start_date", FieldKind::Date, "Period start, resolved to a concrete date"),
                FieldSpec::optional("end_date", FieldKind::Date, "Period end, resolved to a concrete date"),
                FieldSpec::optional("project", FieldKind::Text, "Project name, if mentioned"),
            ],
        )
    }
}

#[async_trait]
impl ParamExtractor for WorkedHoursExtractor {
    type Params = WorkedHoursParams;

    async fn extract(&self, query: &str, ctx: &TurnContext) -> Result<WorkedHoursParams, HandlerError> {
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

        let mut params: WorkedHoursParams = serde_json::from_value(value)
            .map_err(|e| LanguageModelError::schema_mismatch(e.to_string()))?;

        // Context fill: reuse the previous turn's person for elliptical
        // follow-ups ("and last month?").
        if params.person.is_none() {
            params.person = ctx
                .previous_param("person")
                .and_then(|v| v.as_str())
                .map(str::to_string);
        }

        // Normalize the period so the service only ever sees a full range.
        match (params.start_date, params.end_date) {
            (Some(start), Some(end)) if start > end => {
                params.start_date = Some(end);
                params.end_date = Some(start);
            }
            (Some(start), None) => params.end_date = Some(start),
            (None, Some(end)) => params.start_date = Some(end),
            (None, None) => {
                let range = DateRange::this_week(ctx.reference_date);
                params.start_date = Some(range.start());
                params.end_date = Some(range.end());
            }
            _ => {}
        }

        Ok(params)
    }
}

/// One task's contribution to the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourBreakdown {
    /// Day the hours were last updated.
    pub date: NaiveDate,
    /// Task title.
    pub task: String,
    /// Hours logged, rounded to one decimal.
    pub hours: f64,
    /// Task state.
    pub state: WorkItemState,
}

/// Structured result of a worked-hours query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkedHoursResult {
    /// Person the total is for; `None` means everyone matched.
    pub person: Option<String>,
    /// Period start.
    pub start_date: NaiveDate,
    /// Period end.
    pub end_date: NaiveDate,
    /// Sum of logged hours, rounded to one decimal.
    pub total_hours: f64,
    /// Per-task breakdown, tasks with no logged hours omitted.
    pub breakdown: Vec<HourBreakdown>,
    /// Project scope applied, if any.
    pub project: Option<String>,
}

/// Tracker-backed service aggregating logged hours.
pub struct WorkedHoursService {
    tracker: Arc<dyn WorkTracker>,
}

impl WorkedHoursService {
    /// Creates a service over the tracker capability.
    pub fn new(tracker: Arc<dyn WorkTracker>) -> Self {
        Self { tracker }
    }
}

/// Rounds hour sums to one decimal place.
fn round_hours(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[async_trait]
impl IntentService for WorkedHoursService {
    type Params = WorkedHoursParams;
    type Output = WorkedHoursResult;

    async fn query(
        &self,
        params: &WorkedHoursParams,
        ctx: &TurnContext,
    ) -> Result<ServiceOutcome<WorkedHoursResult>, HandlerError> {
        let start = params.start_date.ok_or_else(|| HandlerError::MissingParameter {
            name: "start_date".to_string(),
        })?;
        let end = params.end_date.ok_or_else(|| HandlerError::MissingParameter {
            name: "end_date".to_string(),
        })?;
        let range = DateRange::new(start, end)
            .map_err(|e| HandlerError::Unexpected(format!("unnormalized range: {e}")))?;

        let mut filter = WorkItemFilter::new().updated_within(range);
        if let Some(person) = &params.person {
            filter = filter.with_assignee(person.clone());
        }
        if let Some(project) = &ctx.selected_project {
            filter = filter.with_project(project.id.clone());
        }

        let records = self.tracker.query_items(&filter).await?;

        let mut total = 0.0;
        let mut breakdown = Vec::new();
        for record in &records {
            // Absent hour fields count as zero, never as an error.
            let hours = record.logged_hours();
            total += hours;
            if hours > 0.0 {
                breakdown.push(HourBreakdown {
                    date: record.updated_at.date(),
                    task: record.title.clone(),
                    hours: round_hours(hours),
                    state: record.state,
                });
            }
        }

        Ok(ServiceOutcome::new(WorkedHoursResult {
            person: params.person.clone(),
            start_date: start,
            end_date: end,
            total_hours: round_hours(total),
            breakdown,
            project: ctx.selected_project.as_ref().map(|p| p.name.clone()),
        }))
    }
}

/// Metadata for registry bootstrap.
pub fn metadata() -> IntentMetadata {
    IntentMetadata::new(
        CATEGORY,
        "Worked Hours",
        "Questions about hours worked, logged time, and effort spent on tasks",
        Arc::new(|deps: &HandlerDeps| {
            Arc::new(IntentPipeline::new(
                CATEGORY,
                WorkedHoursExtractor::new(deps.language_model.clone()),
                WorkedHoursService::new(deps.tracker.clone()),
            ))
        }),
    )
    .with_agent_name("hours_agent")
    .with_llm_finish()
}
