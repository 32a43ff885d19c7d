//! Answer composition over structured results.
//!
//! Runs only for intents whose metadata requests a natural-language finish.
//! Composition failure is deliberately non-fatal: the turn already produced
//! valid data, so the dispatcher falls back to a generic message instead of
//! erroring the request.

use std::sync::Arc;

use serde_json::Value;

use crate::ports::{CompositionRequest, LanguageModel};

/// Composes natural-language answers over structured results.
pub struct AnswerComposer {
    language_model: Arc<dyn LanguageModel>,
}

impl AnswerComposer {
    /// Creates a composer over the language-model capability.
    pub fn new(language_model: Arc<dyn LanguageModel>) -> Self {
        Self { language_model }
    }

    /// Composes an answer, or `None` when the capability fails.
    pub async fn compose(
        &self,
        query: &str,
        intent: &str,
        data: &Value,
        context: Option<String>,
    ) -> Option<String> {
        match self
            .language_model
            .compose(CompositionRequest {
                query: query.to_string(),
                intent: intent.to_string(),
                data: data.clone(),
                context,
            })
            .await
        {
            Ok(answer) => Some(answer),
            Err(err) => {
                tracing::warn!(intent, error = %err, "answer composition failed");
                None
            }
        }
    }
}
