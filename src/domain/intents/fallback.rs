//! Fallback intent for queries outside the tracker domain.
//!
//! Also the routing target for unknown or low-confidence classifications, so
//! it must always be registered.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::TurnContext;

use super::pipeline::{
    EchoExtractor, EchoParams, HandlerError, IntentPipeline, IntentService, ServiceOutcome,
};
use super::registry::{HandlerDeps, IntentMetadata};

/// Registry identifier for this intent.
pub const CATEGORY: &str = "fallback";

const MESSAGE: &str = "I'm an assistant specialized in work-item tracking, so I can't help \
with that topic. Ask me about worked hours, tasks, or projects.";

/// Structured result of a static-message intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticReply {
    /// The pre-composed message.
    pub message: String,
}

/// Service answering with a fixed message and no capability calls.
///
/// Shared by every intent whose response is canned (fallback, "other",
/// placeholders).
#[derive(Debug, Clone)]
pub struct StaticMessageService {
    message: String,
}

impl StaticMessageService {
    /// Creates a service answering with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl IntentService for StaticMessageService {
    type Params = EchoParams;
    type Output = StaticReply;

    async fn query(
        &self,
        _params: &EchoParams,
        _ctx: &TurnContext,
    ) -> Result<ServiceOutcome<StaticReply>, HandlerError> {
        Ok(ServiceOutcome::new(StaticReply {
            message: self.message.clone(),
        })
        .with_message(self.message.clone()))
    }
}

/// Metadata for registry bootstrap.
pub fn metadata() -> IntentMetadata {
    IntentMetadata::new(
        CATEGORY,
        "General Assistance",
        "Questions unrelated to the work-item tracker, greetings, and anything no other intent covers",
        Arc::new(|_deps: &HandlerDeps| {
            Arc::new(IntentPipeline::new(
                CATEGORY,
                EchoExtractor,
                StaticMessageService::new(MESSAGE),
            ))
        }),
    )
    .with_agent_name("default_agent")
}
