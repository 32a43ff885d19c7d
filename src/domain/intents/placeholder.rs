//! Registered-but-unimplemented intents.
//!
//! These keep their categories visible to the classifier so matching queries
//! are acknowledged with a notice instead of being misrouted.

use std::sync::Arc;

use super::fallback::StaticMessageService;
use super::pipeline::{EchoExtractor, IntentPipeline};
use super::registry::{HandlerDeps, IntentMetadata};

const NOTICE: &str = "This capability is not implemented yet, but it is on the roadmap.";

fn placeholder_factory() -> super::registry::HandlerFactory {
    Arc::new(|_deps: &HandlerDeps| {
        Arc::new(IntentPipeline::new(
            "placeholder",
            EchoExtractor,
            StaticMessageService::new(NOTICE),
        ))
    })
}

/// Metadata for the project-progress placeholder.
pub fn project_progress_metadata() -> IntentMetadata {
    IntentMetadata::new(
        "project_progress",
        "Project Progress",
        "Questions about overall project status, completion, and progress",
        placeholder_factory(),
    )
    .with_agent_name("progress_agent")
    .placeholder()
}

/// Metadata for the daily-activities placeholder.
pub fn daily_activities_metadata() -> IntentMetadata {
    IntentMetadata::new(
        "daily_activities",
        "Daily Activities",
        "Questions about daily activities, today's tasks, and work routines",
        placeholder_factory(),
    )
    .with_agent_name("activities_agent")
    .placeholder()
}
