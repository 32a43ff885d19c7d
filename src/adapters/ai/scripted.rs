//! Scripted language model for testing.
//!
//! A configurable implementation of the `LanguageModel` port that answers
//! from pre-loaded queues instead of calling a real API, making the dispatch
//! core fully deterministic under test.
//!
//! # Example
//!
//! ```ignore
//! let model = ScriptedLanguageModel::new()
//!     .with_classification("worked_hours", 0.93)
//!     .with_extraction(json!({"person": "Alice"}));
//!
//! // Assert on recorded calls afterwards:
//! assert_eq!(model.classify_calls().len(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::ports::{
    ClassificationOutcome, ClassificationRequest, CompositionRequest, ExtractionRequest,
    LanguageModel, LanguageModelError,
};

/// Scripted language-model capability.
///
/// Queued responses are consumed in order; an exhausted queue fails with
/// `Unavailable` so a missing stub shows up loudly in tests.
#[derive(Debug, Default)]
pub struct ScriptedLanguageModel {
    classifications: Mutex<VecDeque<Result<ClassificationOutcome, LanguageModelError>>>,
    extractions: Mutex<VecDeque<Result<Value, LanguageModelError>>>,
    compositions: Mutex<VecDeque<Result<String, LanguageModelError>>>,
    classify_calls: Mutex<Vec<ClassificationRequest>>,
    extract_calls: Mutex<Vec<ExtractionRequest>>,
    compose_calls: Mutex<Vec<CompositionRequest>>,
}

impl ScriptedLanguageModel {
    /// Creates a model with empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful classification.
    pub fn with_classification(self, identifier: impl Into<String>, confidence: f32) -> Self {
        self.push_classification(Ok(ClassificationOutcome {
            identifier: identifier.into(),
            confidence,
            reasoning: None,
        }));
        self
    }

    /// Queues a classification error.
    pub fn with_classification_error(self, error: LanguageModelError) -> Self {
        self.push_classification(Err(error));
        self
    }

    /// Queues a successful extraction result.
    pub fn with_extraction(self, value: Value) -> Self {
        self.push_extraction(Ok(value));
        self
    }

    /// Queues an extraction error.
    pub fn with_extraction_error(self, error: LanguageModelError) -> Self {
        self.push_extraction(Err(error));
        self
    }

    /// Queues a successful composition.
    pub fn with_composition(self, answer: impl Into<String>) -> Self {
        self.push_composition(Ok(answer.into()));
        self
    }

    /// Queues a composition error.
    pub fn with_composition_error(self, error: LanguageModelError) -> Self {
        self.push_composition(Err(error));
        self
    }

    /// Queues a classification outcome after construction.
    pub fn push_classification(&self, outcome: Result<ClassificationOutcome, LanguageModelError>) {
        self.classifications.lock().unwrap().push_back(outcome);
    }

    /// Queues an extraction outcome after construction.
    pub fn push_extraction(&self, outcome: Result<Value, LanguageModelError>) {
        self.extractions.lock().unwrap().push_back(outcome);
    }

    /// Queues a composition outcome after construction.
    pub fn push_composition(&self, outcome: Result<String, LanguageModelError>) {
        self.compositions.lock().unwrap().push_back(outcome);
    }

    /// Recorded classification requests.
    pub fn classify_calls(&self) -> Vec<ClassificationRequest> {
        self.classify_calls.lock().unwrap().clone()
    }

    /// Recorded extraction requests.
    pub fn extract_calls(&self) -> Vec<ExtractionRequest> {
        self.extract_calls.lock().unwrap().clone()
    }

    /// Recorded composition requests.
    pub fn compose_calls(&self) -> Vec<CompositionRequest> {
        self.compose_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn classify(
        &self,
        request: ClassificationRequest,
    ) -> Result<ClassificationOutcome, LanguageModelError> {
        self.classify_calls.lock().unwrap().push(request);
        self.classifications
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(LanguageModelError::unavailable(
                    "no scripted classification queued",
                ))
            })
    }

    async fn extract(&self, request: ExtractionRequest) -> Result<Value, LanguageModelError> {
        self.extract_calls.lock().unwrap().push(request);
        self.extractions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(LanguageModelError::unavailable(
                    "no scripted extraction queued",
                ))
            })
    }

    async fn compose(&self, request: CompositionRequest) -> Result<String, LanguageModelError> {
        self.compose_calls.lock().unwrap().push(request);
        self.compositions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(LanguageModelError::unavailable(
                    "no scripted composition queued",
                ))
            })
    }
}
