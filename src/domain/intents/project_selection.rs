//! Project-selection intent: pin a project for the rest of the conversation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::{ProjectUpdate, TurnContext};
use crate::domain::work::{ProjectRef, WorkItemFilter, WorkItemKind, WorkItemRecord};
use crate::ports::{
    ExtractionRequest, FieldKind, FieldSpec, LanguageModel, LanguageModelError, ParameterSchema,
    WorkTracker,
};

use super::pipeline::{
    HandlerError, IntentParams, IntentPipeline, IntentService, ParamExtractor, ServiceOutcome,
};
use super::project_search::{rank_projects, ProjectHit};
use super::registry::{HandlerDeps, IntentMetadata};

/// Registry identifier for this intent.
pub const CATEGORY: &str = "project_selection";

/// Example prompts for classification testing.
pub fn examples() -> &'static [&'static str] {
    &[
        "select the Delta project",
        "quero trabalhar no projeto Gen AI",
        "switch to the payments project",
    ]
}

const INSTRUCTIONS: &str = "Extract the project the user wants to select.\n\
Rules:\n\
1. project_name: the project identifier the user mentions; partial names are fine.\n\
2. If the assistant just listed projects and the user answers with a number, \
return that number as the project_name.";

/// Parameters extracted for a project-selection query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSelectionParams {
    /// The project name to select.
    pub project_name: Option<String>,
}

impl IntentParams for ProjectSelectionParams {
    fn explicit_project(&self) -> Option<&str> {
        self.project_name.as_deref()
    }
}

/// LLM-backed extractor for the project name.
pub struct ProjectSelectionExtractor {
    language_model: Arc<dyn LanguageModel>,
}

impl ProjectSelectionExtractor {
    /// Creates an extractor over the language-model capability.
    pub fn new(language_model: Arc<dyn LanguageModel>) -> Self {
        Self { language_model }
    }
}

#[async_trait]
impl ParamExtractor for ProjectSelectionExtractor {
    type Params = ProjectSelectionParams;

    async fn extract(
        &self,
        query: &str,
        ctx: &TurnContext,
    ) -> Result<ProjectSelectionParams, HandlerError> {
        let value = self
            .language_model
            .extract(ExtractionRequest {
                query: query.to_string(),
                instructions: INSTRUCTIONS.to_string(),
                schema: ParameterSchema::new(
                    CATEGORY,
                    vec![FieldSpec::required(
                        "project_name",
                        FieldKind::Text,
                        "The project name or number to select",
                    )],
                ),
                context: ctx.prompt_summary(),
                reference_date: ctx.reference_date,
            })
            .await?;

        let params: ProjectSelectionParams = serde_json::from_value(value)
            .map_err(|e| LanguageModelError::schema_mismatch(e.to_string()))?;

        // Selection cannot proceed without a name; surface the parameter by
        // name so the caller can prompt for it.
        if params.project_name.as_deref().map_or(true, str::is_empty) {
            return Err(HandlerError::MissingParameter {
                name: "project_name".to_string(),
            });
        }

        Ok(params)
    }
}

/// Structured result of a selection attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSelectionResult {
    /// The selected project, when exactly one matched.
    pub selected: Option<ProjectHit>,
    /// Alternatives when the name was ambiguous or unknown.
    pub candidates: Vec<ProjectHit>,
}

/// Tracker-backed service resolving a name to one project.
pub struct ProjectSelectionService {
    tracker: Arc<dyn WorkTracker>,
}

impl ProjectSelectionService {
    /// Creates a service over the tracker capability.
    pub fn new(tracker: Arc<dyn WorkTracker>) -> Self {
        Self { tracker }
    }

    fn matches<'a>(records: &'a [WorkItemRecord], name: &str) -> Vec<&'a WorkItemRecord> {
        let needle = name.to_lowercase();
        records
            .iter()
            .filter(|record| record.title.to_lowercase().contains(&needle))
            .collect()
    }
}

#[async_trait]
impl IntentService for ProjectSelectionService {
    type Params = ProjectSelectionParams;
    type Output = ProjectSelectionResult;

    async fn query(
        &self,
        params: &ProjectSelectionParams,
        _ctx: &TurnContext,
    ) -> Result<ServiceOutcome<ProjectSelectionResult>, HandlerError> {
        let name = params
            .project_name
            .as_deref()
            .ok_or_else(|| HandlerError::MissingParameter {
                name: "project_name".to_string(),
            })?;

        let filter = WorkItemFilter::new().with_kind(WorkItemKind::Epic);
        let records = self.tracker.query_items(&filter).await?;
        let matches = Self::matches(&records, name);

        match matches.as_slice() {
            [only] => {
                let hit = ProjectHit::from_record(only);
                let project = ProjectRef::new(hit.id.clone(), hit.name.clone());
                let message = format!("Project '{}' selected.", hit.name);
                Ok(ServiceOutcome::new(ProjectSelectionResult {
                    selected: Some(hit),
                    candidates: Vec::new(),
                })
                .with_message(message)
                .with_project_update(ProjectUpdate::Select(project)))
            }
            [] => {
                let terms = vec![name.to_string()];
                let mut candidates = rank_projects(&records, &terms);
                candidates.truncate(5);
                let message = if candidates.is_empty() {
                    format!("Project '{name}' not found.")
                } else {
                    let names: Vec<_> =
                        candidates.iter().map(|hit| hit.name.as_str()).collect();
                    format!(
                        "Project '{name}' not found. Did you mean: {}?",
                        names.join(", ")
                    )
                };
                Ok(ServiceOutcome::new(ProjectSelectionResult {
                    selected: None,
                    candidates,
                })
                .with_message(message))
            }
            many => {
                let owned: Vec<WorkItemRecord> = many.iter().map(|r| (*r).clone()).collect();
                let candidates = rank_projects(&owned, &[name.to_string()]);
                let message = format!(
                    "Found {} projects matching '{name}'. Please specify which one.",
                    candidates.len()
                );
                Ok(ServiceOutcome::new(ProjectSelectionResult {
                    selected: None,
                    candidates,
                })
                .with_message(message))
            }
        }
    }
}

/// Metadata for registry bootstrap.
pub fn metadata() -> IntentMetadata {
    IntentMetadata::new(
        CATEGORY,
        "Project Selection",
        "Requests to select, switch to, or work within a specific project",
        Arc::new(|deps: &HandlerDeps| {
            Arc::new(IntentPipeline::new(
                CATEGORY,
                ProjectSelectionExtractor::new(deps.language_model.clone()),
                ProjectSelectionService::new(deps.tracker.clone()),
            ))
        }),
    )
    .with_agent_name("projects_agent")
}
