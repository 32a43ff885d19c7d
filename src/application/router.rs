//! Router - maps a raw query to exactly one registered intent.
//!
//! Single-purpose by design: classification only, no parameter extraction
//! and no memory writes. Anything the capability returns that is not a known
//! intent above the confidence threshold routes to the fallback intent; a
//! classification failure is a routing decision, never a request failure.

use std::sync::Arc;

use crate::config::RoutingConfig;
use crate::domain::conversation::{ConversationState, TurnDigest};
use crate::domain::intents::{IntentRegistry, FALLBACK_CATEGORY};
use crate::ports::{ClassificationRequest, IntentChoice, LanguageModel};

/// Outcome of routing one query.
#[derive(Debug, Clone)]
pub struct RouteDecision {
    /// Category to dispatch to; always present in the registry.
    pub category: String,
    /// Confidence reported by the capability (0.0 when it failed).
    pub confidence: f32,
    /// Whether the decision fell back instead of trusting the capability.
    pub fell_back: bool,
    /// Capability-provided reasoning, when available.
    pub reasoning: Option<String>,
}

/// Classifies queries against the registered intent set.
pub struct Router {
    registry: Arc<IntentRegistry>,
    language_model: Arc<dyn LanguageModel>,
    config: RoutingConfig,
}

impl Router {
    /// Creates a router over the registry and the classification capability.
    pub fn new(
        registry: Arc<IntentRegistry>,
        language_model: Arc<dyn LanguageModel>,
        config: RoutingConfig,
    ) -> Self {
        Self {
            registry,
            language_model,
            config,
        }
    }

    /// Routes a query to a registered intent.
    pub async fn route(&self, query: &str, state: &ConversationState) -> RouteDecision {
        let choices: Vec<IntentChoice> = self
            .registry
            .list_all()
            .iter()
            .map(|metadata| IntentChoice {
                identifier: metadata.category.to_string(),
                description: format!("{} - {}", metadata.display_name, metadata.description),
            })
            .collect();

        let skip = state.len().saturating_sub(self.config.recent_turns);
        let recent_turns: Vec<TurnDigest> = state
            .turns()
            .iter()
            .skip(skip)
            .map(|turn| TurnDigest {
                query: turn.query.clone(),
                intent: turn.intent.clone(),
            })
            .collect();

        let request = ClassificationRequest {
            query: query.to_string(),
            choices,
            recent_turns,
            selected_project: state.selected_project().map(|p| p.name.clone()),
        };

        match self.language_model.classify(request).await {
            Ok(outcome) => {
                if self.registry.get(&outcome.identifier).is_none() {
                    // Capability hallucination: fail closed onto the fallback.
                    tracing::warn!(
                        identifier = %outcome.identifier,
                        "classifier returned an unregistered intent"
                    );
                    self.fallback(outcome.confidence, outcome.reasoning)
                } else if outcome.confidence < self.config.confidence_threshold {
                    tracing::debug!(
                        identifier = %outcome.identifier,
                        confidence = outcome.confidence,
                        threshold = self.config.confidence_threshold,
                        "classification below threshold"
                    );
                    self.fallback(outcome.confidence, outcome.reasoning)
                } else {
                    RouteDecision {
                        category: outcome.identifier,
                        confidence: outcome.confidence,
                        fell_back: false,
                        reasoning: outcome.reasoning,
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "classification capability failed, using fallback");
                self.fallback(0.0, None)
            }
        }
    }

    fn fallback(&self, confidence: f32, reasoning: Option<String>) -> RouteDecision {
        RouteDecision {
            category: FALLBACK_CATEGORY.to_string(),
            confidence,
            fell_back: true,
            reasoning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::ScriptedLanguageModel;
    use crate::ports::LanguageModelError;

    fn router(model: ScriptedLanguageModel) -> Router {
        Router::new(
            Arc::new(IntentRegistry::builtin()),
            Arc::new(model),
            RoutingConfig::default(),
        )
    }

    #[tokio::test]
    async fn confident_known_intent_routes_directly() {
        let router = router(ScriptedLanguageModel::new().with_classification("worked_hours", 0.92));
        let decision = router.route("horas da Alice", &ConversationState::new()).await;
        assert_eq!(decision.category, "worked_hours");
        assert!(!decision.fell_back);
        assert!((decision.confidence - 0.92).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn unregistered_identifier_falls_back() {
        let router = router(ScriptedLanguageModel::new().with_classification("made_up", 0.99));
        let decision = router.route("anything", &ConversationState::new()).await;
        assert_eq!(decision.category, FALLBACK_CATEGORY);
        assert!(decision.fell_back);
    }

    #[tokio::test]
    async fn low_confidence_falls_back() {
        let router = router(ScriptedLanguageModel::new().with_classification("worked_hours", 0.2));
        let decision = router.route("hmm", &ConversationState::new()).await;
        assert_eq!(decision.category, FALLBACK_CATEGORY);
        assert!(decision.fell_back);
        assert!((decision.confidence - 0.2).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn capability_failure_falls_back_without_erroring() {
        let router = router(
            ScriptedLanguageModel::new()
                .with_classification_error(LanguageModelError::unavailable("down")),
        );
        let decision = router.route("anything", &ConversationState::new()).await;
        assert_eq!(decision.category, FALLBACK_CATEGORY);
        assert_eq!(decision.confidence, 0.0);
    }

    #[tokio::test]
    async fn classification_request_enumerates_every_registered_intent() {
        let model = Arc::new(ScriptedLanguageModel::new().with_classification("worked_hours", 0.9));
        let registry = Arc::new(IntentRegistry::builtin());
        let expected = registry.len();
        let router = Router::new(registry, model.clone(), RoutingConfig::default());

        router.route("horas", &ConversationState::new()).await;

        let calls = model.classify_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].choices.len(), expected);
    }
}
