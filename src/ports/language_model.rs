//! Language Model Port - Interface for the hosted completion capabilities.
//!
//! The dispatch core consumes the language model through three narrow
//! operations: classify text into one of an enumerated set of intents,
//! extract a structured object of a given schema from text, and compose a
//! natural-language answer over a structured result. All non-determinism
//! lives behind this port; the core stays deterministic given fixed outcomes,
//! which is what makes the dispatch pipeline testable with scripted adapters.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::conversation::TurnDigest;

/// One intent option offered to the classification capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentChoice {
    /// Registry identifier (e.g., "worked_hours").
    pub identifier: String,
    /// Description the classifier matches the query against.
    pub description: String,
}

/// Request to classify a query against an enumerated intent set.
#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    /// Raw user query.
    pub query: String,
    /// Every registered intent, in registration order.
    pub choices: Vec<IntentChoice>,
    /// Digests of recent turns for context carry-over.
    pub recent_turns: Vec<TurnDigest>,
    /// Name of the currently selected project, if any.
    pub selected_project: Option<String>,
}

/// Outcome of a classification call.
///
/// The identifier is whatever the capability returned; the router is
/// responsible for validating it against the registry (fail closed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    /// Selected intent identifier.
    pub identifier: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Short model-provided justification, if any.
    pub reasoning: Option<String>,
}

/// Type of a single extraction schema field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Numeric value.
    Number,
    /// ISO calendar date (YYYY-MM-DD).
    Date,
    /// Boolean flag.
    Flag,
    /// List of free-text values.
    TextList,
    /// One of a closed set of values.
    OneOf(Vec<String>),
}

/// A named, typed field in an extraction schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name as it must appear in the returned object.
    pub name: String,
    /// Field type.
    pub kind: FieldKind,
    /// Guidance for the extraction capability.
    pub description: String,
    /// Whether the capability must supply a non-null value.
    pub required: bool,
}

impl FieldSpec {
    /// Creates an optional field.
    pub fn optional(name: impl Into<String>, kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
        }
    }

    /// Creates a required field.
    pub fn required(name: impl Into<String>, kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
        }
    }
}

/// Target schema for a structured extraction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Schema name, typically the intent category.
    pub name: String,
    /// Ordered field specifications.
    pub fields: Vec<FieldSpec>,
}

impl ParameterSchema {
    /// Creates a schema with the given fields.
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// Request to extract a structured object from text.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Raw user query.
    pub query: String,
    /// Intent-specific extraction instructions.
    pub instructions: String,
    /// Target schema the returned object must satisfy.
    pub schema: ParameterSchema,
    /// Formatted conversation context for parameter carry-over.
    pub context: String,
    /// "Today", for resolving relative time expressions.
    pub reference_date: NaiveDate,
}

/// Request to compose a natural-language answer over a structured result.
#[derive(Debug, Clone)]
pub struct CompositionRequest {
    /// Raw user query.
    pub query: String,
    /// Intent that produced the data.
    pub intent: String,
    /// Structured result to narrate.
    pub data: Value,
    /// Formatted conversation context, if any.
    pub context: Option<String>,
}

/// Errors surfaced by the language-model capability.
#[derive(Debug, Clone, Error)]
pub enum LanguageModelError {
    /// The capability did not answer within the configured timeout.
    #[error("Language model timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },

    /// The capability is rate limiting the caller.
    #[error("Language model rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Credentials were rejected.
    #[error("Language model authentication failed")]
    AuthenticationFailed,

    /// The capability is temporarily unavailable.
    #[error("Language model unavailable: {0}")]
    Unavailable(String),

    /// Transport-level failure.
    #[error("Language model network error: {0}")]
    Network(String),

    /// The capability answered with something that could not be parsed.
    #[error("Language model returned an unparseable response: {0}")]
    InvalidResponse(String),

    /// The returned object did not satisfy the requested schema.
    #[error("Extraction did not satisfy the schema: {0}")]
    SchemaMismatch(String),
}

impl LanguageModelError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Creates a schema-mismatch error.
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch(message.into())
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::RateLimited { .. } | Self::Unavailable(_) | Self::Network(_)
        )
    }
}

/// Port for the hosted language-model capabilities.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Classifies a query into one of the enumerated intents.
    ///
    /// The returned identifier is not guaranteed to be in the enumerated set;
    /// callers must validate and fall back on mismatch.
    async fn classify(
        &self,
        request: ClassificationRequest,
    ) -> Result<ClassificationOutcome, LanguageModelError>;

    /// Extracts an object satisfying `request.schema` from the query.
    ///
    /// Either the full schema is satisfied or the call fails; partial
    /// objects are never returned.
    async fn extract(&self, request: ExtractionRequest) -> Result<Value, LanguageModelError>;

    /// Composes a natural-language answer over a structured result.
    async fn compose(&self, request: CompositionRequest) -> Result<String, LanguageModelError>;
}
