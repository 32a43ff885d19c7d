//! Help intent listing what the assistant can do.
//!
//! Answers from the registry catalog snapshot, so newly added intents show up
//! without touching this module.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::TurnContext;

use super::pipeline::{
    EchoExtractor, EchoParams, HandlerError, IntentPipeline, IntentService, ServiceOutcome,
};
use super::registry::{HandlerDeps, IntentMetadata, IntentSummary};

/// Registry identifier for this intent.
pub const CATEGORY: &str = "available_actions";

/// Structured catalog listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableActionsResult {
    /// Implemented intents, in registration order.
    pub intents: Vec<IntentSummary>,
}

/// Service describing the implemented intents.
#[derive(Debug, Clone)]
pub struct AvailableActionsService {
    catalog: Vec<IntentSummary>,
}

impl AvailableActionsService {
    /// Creates the service over a catalog snapshot.
    pub fn new(catalog: Vec<IntentSummary>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl IntentService for AvailableActionsService {
    type Params = EchoParams;
    type Output = AvailableActionsResult;

    async fn query(
        &self,
        _params: &EchoParams,
        _ctx: &TurnContext,
    ) -> Result<ServiceOutcome<AvailableActionsResult>, HandlerError> {
        let intents: Vec<IntentSummary> = self
            .catalog
            .iter()
            .filter(|summary| summary.implemented)
            .cloned()
            .collect();

        let listing = intents
            .iter()
            .map(|summary| format!("- {}: {}", summary.display_name, summary.description))
            .collect::<Vec<_>>()
            .join("\n");
        let message = format!("Here is what I can do for you:\n{listing}");

        Ok(ServiceOutcome::new(AvailableActionsResult { intents }).with_message(message))
    }
}

/// Metadata for registry bootstrap.
pub fn metadata() -> IntentMetadata {
    IntentMetadata::new(
        CATEGORY,
        "Available Actions",
        "Questions about what the assistant can do, help requests, and capability listings",
        Arc::new(|deps: &HandlerDeps| {
            Arc::new(IntentPipeline::new(
                CATEGORY,
                EchoExtractor,
                AvailableActionsService::new(deps.catalog.clone()),
            ))
        }),
    )
    .with_agent_name("help_agent")
}
