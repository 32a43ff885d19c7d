//! Project-team intent: who works on the selected project.
//!
//! The only built-in intent with a hard project requirement: without a
//! selected project the pipeline refuses before the tracker is touched.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::TurnContext;
use crate::domain::work::{WorkItemFilter, WorkItemKind};
use crate::ports::WorkTracker;

use super::pipeline::{
    HandlerError, IntentParams, IntentPipeline, IntentService, ParamExtractor, ServiceOutcome,
};
use super::registry::{HandlerDeps, IntentMetadata};

/// Registry identifier for this intent.
pub const CATEGORY: &str = "project_team";

/// Team queries take no parameters; the project comes from the conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectTeamParams {}

impl IntentParams for ProjectTeamParams {
    const REQUIRES_PROJECT_CONTEXT: bool = true;
}

/// No-op extractor; the team query has nothing to extract.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectTeamExtractor;

#[async_trait]
impl ParamExtractor for ProjectTeamExtractor {
    type Params = ProjectTeamParams;

    async fn extract(
        &self,
        _query: &str,
        _ctx: &TurnContext,
    ) -> Result<ProjectTeamParams, HandlerError> {
        Ok(ProjectTeamParams::default())
    }
}

/// One project member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Member display name.
    pub name: String,
}

/// Structured result of a team query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTeamResult {
    /// Members derived from item assignees, sorted by name.
    pub members: Vec<TeamMember>,
    /// Number of distinct members.
    pub total_count: usize,
    /// Name of the project the team belongs to.
    pub project: String,
}

/// Tracker-backed service deriving the team from item assignees.
pub struct ProjectTeamService {
    tracker: Arc<dyn WorkTracker>,
}

impl ProjectTeamService {
    /// Creates a service over the tracker capability.
    pub fn new(tracker: Arc<dyn WorkTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl IntentService for ProjectTeamService {
    type Params = ProjectTeamParams;
    type Output = ProjectTeamResult;

    async fn query(
        &self,
        _params: &ProjectTeamParams,
        ctx: &TurnContext,
    ) -> Result<ServiceOutcome<ProjectTeamResult>, HandlerError> {
        let project = ctx
            .selected_project
            .as_ref()
            .ok_or(HandlerError::ProjectContextRequired)?;

        let filter = WorkItemFilter::new()
            .with_project(project.id.clone())
            .with_kind(WorkItemKind::Task)
            .with_kind(WorkItemKind::Bug)
            .with_kind(WorkItemKind::Story)
            .with_kind(WorkItemKind::Feature);

        let records = self.tracker.query_items(&filter).await?;

        let names: BTreeSet<String> = records
            .iter()
            .filter_map(|record| record.assignee.clone())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        let members: Vec<TeamMember> = names.into_iter().map(|name| TeamMember { name }).collect();

        Ok(ServiceOutcome::new(ProjectTeamResult {
            total_count: members.len(),
            members,
            project: project.name.clone(),
        }))
    }
}

/// Metadata for registry bootstrap.
pub fn metadata() -> IntentMetadata {
    IntentMetadata::new(
        CATEGORY,
        "Project Team",
        "Questions about who works on the selected project and team composition",
        Arc::new(|deps: &HandlerDeps| {
            Arc::new(IntentPipeline::new(
                CATEGORY,
                ProjectTeamExtractor,
                ProjectTeamService::new(deps.tracker.clone()),
            ))
        }),
    )
    .with_agent_name("team_agent")
    .with_llm_finish()
}
