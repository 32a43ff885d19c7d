//! Intent for tracker-related queries no implemented intent covers yet.

use std::sync::Arc;

use super::fallback::StaticMessageService;
use super::pipeline::{EchoExtractor, IntentPipeline};
use super::registry::{HandlerDeps, IntentMetadata};

/// Registry identifier for this intent.
pub const CATEGORY: &str = "other";

const MESSAGE: &str = "That looks like a tracker question, but this capability is not \
implemented yet. Right now I can help with worked hours, task lists, delayed tasks, \
project search and selection, and project teams.";

/// Metadata for registry bootstrap.
pub fn metadata() -> IntentMetadata {
    IntentMetadata::new(
        CATEGORY,
        "Other Tracker Queries",
        "Work-tracker questions that do not match any other category",
        Arc::new(|_deps: &HandlerDeps| {
            Arc::new(IntentPipeline::new(
                CATEGORY,
                EchoExtractor,
                StaticMessageService::new(MESSAGE),
            ))
        }),
    )
}
