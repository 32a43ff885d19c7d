//! Project-search intent: discover projects by keyword.
//!
//! The tracker models projects as top-level epic items; this module also
//! hosts the name-scoring helpers `project_selection` reuses for ranking.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::TurnContext;
use crate::domain::work::{WorkItemFilter, WorkItemKind, WorkItemRecord, WorkItemState};
use crate::ports::{
    ExtractionRequest, FieldKind, FieldSpec, LanguageModel, LanguageModelError, ParameterSchema,
    WorkTracker,
};

use super::pipeline::{
    HandlerError, IntentParams, IntentPipeline, IntentService, ParamExtractor, ServiceOutcome,
};
use super::registry::{HandlerDeps, IntentMetadata};

/// Registry identifier for this intent.
pub const CATEGORY: &str = "project_search";

/// Example prompts for classification testing.
pub fn examples() -> &'static [&'static str] {
    &[
        "quais projetos de IA existem?",
        "search for projects about payments",
        "list all active projects",
    ]
}

const INSTRUCTIONS: &str = "Extract project-search parameters from the user's message.\n\
Rules:\n\
1. terms: keywords worth searching project names for; an empty list means list everything.\n\
2. state: map wording like \"active\" or \"finished\" onto the allowed values, else null.";

/// Parameters extracted for a project-search query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSearchParams {
    /// Search keywords; empty lists every project.
    #[serde(default)]
    pub terms: Vec<String>,
    /// Restrict to projects in this state.
    pub state: Option<WorkItemState>,
}

impl IntentParams for ProjectSearchParams {}

/// LLM-backed extractor for project-search parameters.
pub struct ProjectSearchExtractor {
    language_model: Arc<dyn LanguageModel>,
}

impl ProjectSearchExtractor {
    /// Creates an extractor over the language-model capability.
    pub fn new(language_model: Arc<dyn LanguageModel>) -> Self {
        Self { language_model }
    }
}

#[async_trait]
impl ParamExtractor for ProjectSearchExtractor {
    type Params = ProjectSearchParams;

    async fn extract(
        &self,
        query: &str,
        ctx: &TurnContext,
    ) -> Result<ProjectSearchParams, HandlerError> {
        let value = self
            .language_model
            .extract(ExtractionRequest {
                query: query.to_string(),
                instructions: INSTRUCTIONS.to_string(),
                schema: ParameterSchema::new(
                    CATEGORY,
                    vec![
                        FieldSpec::optional("terms", FieldKind::TextList, "Search keywords"),
                        FieldSpec::optional(
                            "state",
                            FieldKind::OneOf(vec![
                                "new".into(),
                                "active".into(),
                                "closed".into(),
                            ]),
                            "Project state filter",
                        ),
                    ],
                ),
                context: ctx.prompt_summary(),
                reference_date: ctx.reference_date,
            })
            .await?;

        serde_json::from_value(value)
            .map_err(|e| LanguageModelError::schema_mismatch(e.to_string()).into())
    }
}

/// One matching project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectHit {
    /// Stable project identifier.
    pub id: String,
    /// Project name.
    pub name: String,
    /// Project state.
    pub state: WorkItemState,
}

impl ProjectHit {
    pub(crate) fn from_record(record: &WorkItemRecord) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.title.clone(),
            state: record.state,
        }
    }
}

/// Relevance of `name` for a single search term.
///
/// Exact match beats prefix match beats substring match beats word-prefix.
pub(crate) fn score_name(name: &str, term: &str) -> u8 {
    let name = name.to_lowercase();
    let term = term.to_lowercase();
    if name == term {
        100
    } else if name.starts_with(&term) {
        80
    } else if name.contains(&term) {
        60
    } else if name.split_whitespace().any(|word| word.starts_with(&term)) {
        40
    } else {
        0
    }
}

/// Best score of `name` across all terms.
pub(crate) fn best_score(name: &str, terms: &[String]) -> u8 {
    terms
        .iter()
        .map(|term| score_name(name, term))
        .max()
        .unwrap_or(0)
}

/// Ranks project records against search terms, best first, dropping
/// non-matches. Ties break on tracker id for deterministic output.
pub(crate) fn rank_projects(records: &[WorkItemRecord], terms: &[String]) -> Vec<ProjectHit> {
    let mut scored: Vec<(u8, &WorkItemRecord)> = records
        .iter()
        .map(|record| (best_score(&record.title, terms), record))
        .filter(|(score, _)| *score > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.id.cmp(&b.1.id)));
    scored
        .into_iter()
        .map(|(_, record)| ProjectHit::from_record(record))
        .collect()
}

/// Structured result of a project search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSearchResult {
    /// Matching projects, best match first.
    pub projects: Vec<ProjectHit>,
    /// Total number of matches.
    pub total_found: usize,
    /// Human-readable description of what was searched.
    pub search_summary: String,
}

/// Tracker-backed service searching projects by name.
pub struct ProjectSearchService {
    tracker: Arc<dyn WorkTracker>,
}

impl ProjectSearchService {
    /// Creates a service over the tracker capability.
    pub fn new(tracker: Arc<dyn WorkTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl IntentService for ProjectSearchService {
    type Params = ProjectSearchParams;
    type Output = ProjectSearchResult;

    async fn query(
        &self,
        params: &ProjectSearchParams,
        _ctx: &TurnContext,
    ) -> Result<ServiceOutcome<ProjectSearchResult>, HandlerError> {
        let mut filter = WorkItemFilter::new().with_kind(WorkItemKind::Epic);
        if let Some(state) = params.state {
            filter = filter.with_state(state);
        }

        let records = self.tracker.query_items(&filter).await?;

        let projects = if params.terms.is_empty() {
            records.iter().map(ProjectHit::from_record).collect()
        } else {
            rank_projects(&records, &params.terms)
        };

        let search_summary = if params.terms.is_empty() {
            "Listed all projects".to_string()
        } else {
            format!("Searched projects matching: {}", params.terms.join(", "))
        };

        Ok(ServiceOutcome::new(ProjectSearchResult {
            total_found: projects.len(),
            projects,
            search_summary,
        }))
    }
}

/// Metadata for registry bootstrap.
pub fn metadata() -> IntentMetadata {
    IntentMetadata::new(
        CATEGORY,
        "Project Search",
        "Questions exploring or discovering projects by name, topic, or state",
        Arc::new(|deps: &HandlerDeps| {
            Arc::new(IntentPipeline::new(
                CATEGORY,
                ProjectSearchExtractor::new(deps.language_model.clone()),
                ProjectSearchService::new(deps.tracker.clone()),
            ))
        }),
    )
    .with_agent_name("projects_agent")
    .with_llm_finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tracker::InMemoryWorkTracker;
    use crate::domain::foundation::{ConversationId, Timestamp};
    use chrono::{NaiveDate, TimeZone, Utc};

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

    fn epic(id: u64, title: &str) -> WorkItemRecord {
        let at = Timestamp::from_datetime(Utc.with_ymd_and_hms(2025, 11, 1, 9, 0, 0).unwrap());
        WorkItemRecord {
            id,
            title: title.to_string(),
            kind: WorkItemKind::Epic,
            state: WorkItemState::Active,
            assignee: None,
            project: None,
            completed_hours: None,
            estimated_hours: None,
            target_date: None,
            created_at: at,
            updated_at: at,
            tags: Vec::new(),
            parent_id: None,
        }
    }

    #[test]
    fn scoring_prefers_exact_then_prefix_then_substring() {
        assert_eq!(score_name("Delta", "delta"), 100);
        assert_eq!(score_name("Delta Platform", "delta"), 80);
        assert_eq!(score_name("Project Delta", "delta"), 60);
        assert_eq!(score_name("Data Delivery", "del"), 40);
        assert_eq!(score_name("Gamma", "delta"), 0);
    }

    #[tokio::test]
    async fn search_ranks_matches_and_drops_misses() {
        let tracker = Arc::new(InMemoryWorkTracker::with_items(vec![
            epic(1, "Gamma"),
            epic(2, "Project Delta"),
            epic(3, "Delta Platform"),
        ]));
        let service = ProjectSearchService::new(tracker);

        let params = ProjectSearchParams {
            terms: vec!["delta".to_string()],
            state: None,
        };
        let outcome = service.query(&params, &context()).await.unwrap();
        let names: Vec<_> = outcome.output.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Delta Platform", "Project Delta"]);
        assert_eq!(outcome.output.total_found, 2);
    }

    #[tokio::test]
    async fn empty_terms_list_every_project() {
        let tracker = Arc::new(InMemoryWorkTracker::with_items(vec![
            epic(1, "Gamma"),
            epic(2, "Delta"),
        ]));
        let service = ProjectSearchService::new(tracker);

        let params = ProjectSearchParams {
            terms: Vec::new(),
            state: None,
        };
        let outcome = service.query(&params, &context()).await.unwrap();
        assert_eq!(outcome.output.total_found, 2);
        assert!(outcome.output.search_summary.contains("all projects"));
    }
}
