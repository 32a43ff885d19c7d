//! Project-deselection intent: drop the pinned project.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::{ProjectUpdate, TurnContext};

use super::pipeline::{
    HandlerError, IntentParams, IntentPipeline, IntentService, ParamExtractor, ServiceOutcome,
};
use super::registry::{HandlerDeps, IntentMetadata};

/// Registry identifier for this intent.
pub const CATEGORY: &str = "project_deselection";

/// Deselection takes no parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDeselectionParams {}

impl IntentParams for ProjectDeselectionParams {}

/// No-op extractor; deselection never calls the language model.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectDeselectionExtractor;

#[async_trait]
impl ParamExtractor for ProjectDeselectionExtractor {
    type Params = ProjectDeselectionParams;

    async fn extract(
        &self,
        _query: &str,
        _ctx: &TurnContext,
    ) -> Result<ProjectDeselectionParams, HandlerError> {
        Ok(ProjectDeselectionParams::default())
    }
}

/// Structured result of a deselection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDeselectionResult {
    /// Whether a selection was actually cleared.
    pub deselected: bool,
}

/// Service clearing the conversation's selected project.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectDeselectionService;

#[async_trait]
impl IntentService for ProjectDeselectionService {
    type Params = ProjectDeselectionParams;
    type Output = ProjectDeselectionResult;

    async fn query(
        &self,
        _params: &ProjectDeselectionParams,
        ctx: &TurnContext,
    ) -> Result<ServiceOutcome<ProjectDeselectionResult>, HandlerError> {
        if ctx.selected_project.is_none() {
            return Ok(ServiceOutcome::new(ProjectDeselectionResult { deselected: false })
                .with_message("No project is currently selected."));
        }

        Ok(ServiceOutcome::new(ProjectDeselectionResult { deselected: true })
            .with_message(
                "Project deselected. Queries now cover all projects; select a new one any time.",
            )
            .with_project_update(ProjectUpdate::Clear))
    }
}

/// Metadata for registry bootstrap.
pub fn metadata() -> IntentMetadata {
    IntentMetadata::new(
        CATEGORY,
        "Project Deselection",
        "Requests to deselect the current project or go back to querying all projects",
        Arc::new(|_deps: &HandlerDeps| {
            Arc::new(IntentPipeline::new(
                CATEGORY,
                ProjectDeselectionExtractor,
                ProjectDeselectionService,
            ))
        }),
    )
    .with_agent_name("projects_agent")
}
