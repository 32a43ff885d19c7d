//! Dispatcher - the entry point the surrounding request layer calls.
//!
//! Orchestrates one turn: acquire the conversation's turn guard, snapshot
//! memory, route, run the intent pipeline, optionally compose an answer, and
//! append the completed turn. The guard is held from before the first memory
//! read until after the append, so turns within one conversation apply in
//! arrival order while other conversations proceed concurrently. Memory is
//! only written once, at the end - a request abandoned mid-capability-call
//! leaves no partial state.
//!
//! This is also the panic boundary: a misbehaving intent module produces a
//! structured error response, never a crashed dispatch loop.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;

use crate::config::RoutingConfig;
use crate::domain::conversation::{ConversationTurn, ProjectUpdate, TurnContext};
use crate::domain::foundation::ConversationId;
use crate::domain::intents::{
    HandlerDeps, HandlerError, HandlerRequest, IntentRegistry, FALLBACK_CATEGORY,
};
use crate::ports::{ConversationStore, LanguageModel, WorkTracker};

use super::answer::AnswerComposer;
use super::router::{RouteDecision, Router};

const GENERIC_SUCCESS_MESSAGE: &str = "Here is the information I found.";

/// Structured reply for one dispatched query.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReply {
    /// Natural-language answer or user-safe error message.
    pub message: String,
    /// Intent category that handled (or would have handled) the turn.
    pub intent: String,
    /// Classification confidence.
    pub confidence: f32,
    /// Structured result, absent on error.
    pub data: Option<Value>,
    /// Conversation id, generated when the caller omitted one.
    pub conversation_id: ConversationId,
    /// Name of the project selected after this turn, if any.
    pub selected_project: Option<String>,
    /// Stable error code, absent on success.
    pub error: Option<String>,
}

/// Routes and executes conversational queries against the intent registry.
pub struct Dispatcher {
    registry: Arc<IntentRegistry>,
    router: Router,
    composer: AnswerComposer,
    store: Arc<dyn ConversationStore>,
    deps: HandlerDeps,
    recent_turns: usize,
    reference_date: Option<NaiveDate>,
}

impl Dispatcher {
    /// Creates a dispatcher over the registry, capabilities, and memory store.
    pub fn new(
        registry: Arc<IntentRegistry>,
        language_model: Arc<dyn LanguageModel>,
        tracker: Arc<dyn WorkTracker>,
        store: Arc<dyn ConversationStore>,
        routing: RoutingConfig,
    ) -> Self {
        let deps = HandlerDeps {
            language_model: language_model.clone(),
            tracker,
            catalog: registry.summaries(),
        };
        Self {
            router: Router::new(registry.clone(), language_model.clone(), routing.clone()),
            composer: AnswerComposer::new(language_model),
            registry,
            store,
            deps,
            recent_turns: routing.recent_turns,
            reference_date: None,
        }
    }

    /// Pins "today" for relative-date resolution (used by tests; production
    /// resolves it per request).
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    fn today(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Handles one query end to end.
    ///
    /// A missing conversation id starts a new conversation; the generated id
    /// is returned for the caller to reuse on follow-ups.
    pub async fn handle_query(
        &self,
        message: &str,
        conversation_id: Option<ConversationId>,
    ) -> DispatchReply {
        let id = conversation_id.unwrap_or_else(ConversationId::new);

        // Serializes turns for this conversation in arrival order; other
        // conversations are unaffected.
        let _guard = self.store.turn_guard(&id).await;

        let state = self.store.snapshot(&id).await;
        let decision = self.router.route(message, &state).await;

        let Some(metadata) = self
            .registry
            .get(&decision.category)
            .or_else(|| self.registry.get(FALLBACK_CATEGORY))
        else {
            // Only reachable with a registry missing its fallback intent.
            tracing::error!(category = %decision.category, "no handler and no fallback registered");
            return self.error_reply(
                id,
                &decision,
                state.selected_project().map(|p| p.name.clone()),
                &HandlerError::Unexpected("fallback intent missing from registry".to_string()),
            );
        };

        let context = TurnContext::from_state(id, &state, self.today(), self.recent_turns);
        let handler = metadata.handler(&self.deps);

        let handled = AssertUnwindSafe(handler.handle(HandlerRequest {
            query: message,
            context: &context,
        }))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
            tracing::error!(intent = metadata.category, "intent handler panicked");
            Err(HandlerError::Unexpected("intent handler panicked".to_string()))
        });

        match handled {
            Ok(outcome) => {
                let answer = if metadata.requires_llm_finish {
                    self.composer
                        .compose(
                            message,
                            metadata.category,
                            &outcome.data,
                            Some(context.prompt_summary()),
                        )
                        .await
                } else {
                    None
                };
                let reply_message = answer
                    .or_else(|| outcome.direct_message.clone())
                    .unwrap_or_else(|| GENERIC_SUCCESS_MESSAGE.to_string());

                let selected_project = match &outcome.project_update {
                    Some(ProjectUpdate::Select(project)) => Some(project.name.clone()),
                    Some(ProjectUpdate::Clear) => None,
                    None => state.selected_project().map(|p| p.name.clone()),
                };

                let mut turn = ConversationTurn::new(
                    message,
                    metadata.category,
                    outcome.params,
                    outcome.data.clone(),
                );
                if let Some(update) = outcome.project_update {
                    turn = turn.with_project_update(update);
                }
                if let Err(err) = self.store.append_turn(&id, turn).await {
                    tracing::error!(error = %err, "failed to record turn");
                    return self.error_reply(
                        id,
                        &decision,
                        selected_project,
                        &HandlerError::Unexpected(format!("memory append failed: {err}")),
                    );
                }

                tracing::info!(
                    intent = metadata.category,
                    confidence = decision.confidence,
                    conversation = %id,
                    "turn completed"
                );

                DispatchReply {
                    message: reply_message,
                    intent: metadata.category.to_string(),
                    confidence: decision.confidence,
                    data: Some(outcome.data),
                    conversation_id: id,
                    selected_project,
                    error: None,
                }
            }
            Err(err) => {
                // The turn is not recorded: memory never holds partial state.
                tracing::warn!(
                    intent = metadata.category,
                    error = ?err,
                    "turn ended in error"
                );
                self.error_reply(
                    id,
                    &decision,
                    state.selected_project().map(|p| p.name.clone()),
                    &err,
                )
            }
        }
    }

    /// Deletes a conversation's state. Returns whether state existed.
    pub async fn clear(&self, id: &ConversationId) -> bool {
        self.store.clear(id).await
    }

    /// Ids of every conversation with recorded state.
    ///
    /// Advisory: taken without turn guards, so a conversation mid-turn may or
    /// may not appear yet.
    pub async fn list_conversations(&self) -> Vec<ConversationId> {
        self.store.list_ids().await
    }

    fn error_reply(
        &self,
        id: ConversationId,
        decision: &RouteDecision,
        selected_project: Option<String>,
        err: &HandlerError,
    ) -> DispatchReply {
        DispatchReply {
            message: err.to_string(),
            intent: decision.category.clone(),
            confidence: decision.confidence,
            data: None,
            conversation_id: id,
            selected_project,
            error: Some(err.code().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::ScriptedLanguageModel;
    use crate::adapters::memory::InMemoryConversationStore;
    use crate::adapters::tracker::InMemoryWorkTracker;
    use crate::domain::intents::{
        HandlerOutcome, IntentHandler, IntentMetadata, RegistryError,
    };
    use crate::ports::LanguageModelError;
    use async_trait::async_trait;
    use serde_json::json;

    fn dispatcher(model: ScriptedLanguageModel) -> (Dispatcher, Arc<InMemoryConversationStore>) {
        let store = Arc::new(InMemoryConversationStore::new());
        let dispatcher = Dispatcher::new(
            Arc::new(IntentRegistry::builtin()),
            Arc::new(model),
            Arc::new(InMemoryWorkTracker::new()),
            store.clone(),
            RoutingConfig::default(),
        )
        .with_reference_date(NaiveDate::from_ymd_opt(2025, 11, 7).unwrap());
        (dispatcher, store)
    }

    #[tokio::test]
    async fn generates_a_conversation_id_when_omitted() {
        let (dispatcher, store) = dispatcher(
            ScriptedLanguageModel::new().with_classification("available_actions", 0.95),
        );

        let reply = dispatcher.handle_query("what can you do?", None).await;
        assert!(reply.error.is_none());
        assert_eq!(reply.intent, "available_actions");
        assert_eq!(store.snapshot(&reply.conversation_id).await.len(), 1);
    }

    #[tokio::test]
    async fn low_confidence_routes_to_fallback_handler() {
        let (dispatcher, _store) =
            dispatcher(ScriptedLanguageModel::new().with_classification("worked_hours", 0.1));

        let reply = dispatcher.handle_query("hmm?", None).await;
        assert_eq!(reply.intent, FALLBACK_CATEGORY);
        assert!(reply.error.is_none());
        assert!((reply.confidence - 0.1).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn extraction_failure_leaves_memory_untouched() {
        let model = ScriptedLanguageModel::new()
            .with_classification("worked_hours", 0.9)
            .with_extraction_error(LanguageModelError::unavailable("down"));
        let (dispatcher, store) = dispatcher(model);

        let id = ConversationId::new();
        let reply = dispatcher.handle_query("horas da Alice", Some(id)).await;
        assert_eq!(reply.error.as_deref(), Some("extraction_failed"));
        assert!(reply.data.is_none());
        assert!(store.snapshot(&id).await.is_empty());
    }

    #[tokio::test]
    async fn project_requirement_blocks_before_the_service() {
        let model = ScriptedLanguageModel::new().with_classification("project_team", 0.9);
        let (dispatcher, store) = dispatcher(model);

        let reply = dispatcher.handle_query("who is on the team?", None).await;
        assert_eq!(reply.error.as_deref(), Some("project_context_required"));
        assert!(store.snapshot(&reply.conversation_id).await.is_empty());
    }

    #[tokio::test]
    async fn composed_answer_is_used_for_llm_finish_intents() {
        let model = ScriptedLanguageModel::new()
            .with_classification("worked_hours", 0.9)
            .with_extraction(json!({
                "person": "Alice",
                "start_date": "2025-11-03",
                "end_date": "2025-11-09",
                "project": null
            }))
            .with_composition("Alice logged nothing this week.");
        let (dispatcher, _store) = dispatcher(model);

        let reply = dispatcher.handle_query("horas da Alice", None).await;
        assert!(reply.error.is_none());
        assert_eq!(reply.message, "Alice logged nothing this week.");
        assert_eq!(reply.data.as_ref().unwrap()["person"], "Alice");
    }

    #[tokio::test]
    async fn composition_failure_still_succeeds_with_generic_message() {
        let model = ScriptedLanguageModel::new()
            .with_classification("worked_hours", 0.9)
            .with_extraction(json!({
                "person": "Alice",
                "start_date": "2025-11-03",
                "end_date": "2025-11-09",
                "project": null
            }))
            .with_composition_error(LanguageModelError::unavailable("down"));
        let (dispatcher, store) = dispatcher(model);

        let reply = dispatcher.handle_query("horas da Alice", None).await;
        assert!(reply.error.is_none());
        assert_eq!(reply.message, GENERIC_SUCCESS_MESSAGE);
        assert_eq!(store.snapshot(&reply.conversation_id).await.len(), 1);
    }

    struct PanickingHandler;

    #[async_trait]
    impl IntentHandler for PanickingHandler {
        async fn handle(
            &self,
            _request: HandlerRequest<'_>,
        ) -> Result<HandlerOutcome, HandlerError> {
            panic!("intent module bug");
        }
    }

    fn registry_with_panicking_intent() -> Result<IntentRegistry, RegistryError> {
        let mut registry = IntentRegistry::builtin();
        registry.register(IntentMetadata::new(
            "explosive",
            "Explosive",
            "Panics on purpose",
            Arc::new(|_deps| Arc::new(PanickingHandler)),
        ))?;
        Ok(registry)
    }

    #[tokio::test]
    async fn panicking_intent_becomes_a_structured_error() {
        let model = ScriptedLanguageModel::new().with_classification("explosive", 0.99);
        let store = Arc::new(InMemoryConversationStore::new());
        let dispatcher = Dispatcher::new(
            Arc::new(registry_with_panicking_intent().unwrap()),
            Arc::new(model),
            Arc::new(InMemoryWorkTracker::new()),
            store.clone(),
            RoutingConfig::default(),
        );

        let reply = dispatcher.handle_query("boom", None).await;
        assert_eq!(reply.error.as_deref(), Some("unexpected"));
        assert!(store.snapshot(&reply.conversation_id).await.is_empty());
    }
}
