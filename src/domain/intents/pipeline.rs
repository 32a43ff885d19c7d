//! The extractor/service pipeline contract every intent satisfies.
//!
//! An intent is a pair of small components: a `ParamExtractor` turning raw
//! text plus conversation context into typed parameters, and an
//! `IntentService` executing those parameters against the tracker.
//! `IntentPipeline` composes the pair behind the object-safe `IntentHandler`
//! trait the dispatcher works with, adding the project-context check between
//! the two steps.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::conversation::{ProjectUpdate, TurnContext};
use crate::ports::{LanguageModelError, WorkTrackerError};

/// Errors terminating a turn's state machine.
///
/// Every variant maps to a structured error response; display strings are
/// user-safe, with underlying causes reserved for logs.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A required parameter was absent even after context fill.
    #[error("Missing required parameter: {name}")]
    MissingParameter { name: String },

    /// The extraction capability failed or returned schema-invalid data.
    #[error("Could not understand the request")]
    Extraction(#[source] LanguageModelError),

    /// The intent needs a selected project and none is available.
    #[error("A project must be selected before this query can run")]
    ProjectContextRequired,

    /// The tracker capability failed.
    #[error("Could not retrieve the requested data")]
    Service(#[source] WorkTrackerError),

    /// Anything uncaught, converted to a safe response at the boundary.
    #[error("An unexpected internal error occurred")]
    Unexpected(String),
}

impl HandlerError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            HandlerError::MissingParameter { .. } => "missing_parameter",
            HandlerError::Extraction(_) => "extraction_failed",
            HandlerError::ProjectContextRequired => "project_context_required",
            HandlerError::Service(_) => "service_failed",
            HandlerError::Unexpected(_) => "unexpected",
        }
    }
}

impl From<LanguageModelError> for HandlerError {
    fn from(err: LanguageModelError) -> Self {
        HandlerError::Extraction(err)
    }
}

impl From<WorkTrackerError> for HandlerError {
    fn from(err: WorkTrackerError) -> Self {
        HandlerError::Service(err)
    }
}

/// Typed parameters extracted for one intent.
pub trait IntentParams: Serialize + DeserializeOwned + Send + Sync {
    /// Whether the service may only run with a selected project.
    const REQUIRES_PROJECT_CONTEXT: bool = false;

    /// Project explicitly named in this turn, which satisfies the project
    /// requirement on its own.
    fn explicit_project(&self) -> Option<&str> {
        None
    }
}

/// Turns raw text plus context into typed parameters for one intent.
#[async_trait]
pub trait ParamExtractor: Send + Sync {
    /// Parameter type produced by this extractor.
    type Params: IntentParams;

    /// Extracts parameters, consulting `ctx` to fill values omitted in the
    /// current query. Relative time expressions must be resolved to concrete
    /// dates here; services only ever see absolute ranges.
    async fn extract(&self, query: &str, ctx: &TurnContext) -> Result<Self::Params, HandlerError>;
}

/// Executes typed parameters against the external data source.
#[async_trait]
pub trait IntentService: Send + Sync {
    /// Parameter type accepted by this service.
    type Params: IntentParams;

    /// Structured result type produced by this service.
    type Output: Serialize + Send + Sync;

    /// Runs the query. Must be deterministic for identical parameters
    /// against unchanged external data.
    async fn query(
        &self,
        params: &Self::Params,
        ctx: &TurnContext,
    ) -> Result<ServiceOutcome<Self::Output>, HandlerError>;
}

/// What a service hands back besides the structured result.
#[derive(Debug, Clone)]
pub struct ServiceOutcome<T> {
    /// The structured result.
    pub output: T,
    /// Pre-composed message for intents that skip the language-model
    /// composition pass.
    pub direct_message: Option<String>,
    /// Project-selection change this turn should apply to memory.
    pub project_update: Option<ProjectUpdate>,
}

impl<T> ServiceOutcome<T> {
    /// Creates an outcome with just a structured result.
    pub fn new(output: T) -> Self {
        Self {
            output,
            direct_message: None,
            project_update: None,
        }
    }

    /// Attaches a pre-composed message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.direct_message = Some(message.into());
        self
    }

    /// Attaches a project-selection change.
    pub fn with_project_update(mut self, update: ProjectUpdate) -> Self {
        self.project_update = Some(update);
        self
    }
}

/// One dispatch request as seen by a handler.
#[derive(Debug)]
pub struct HandlerRequest<'a> {
    /// Raw user query.
    pub query: &'a str,
    /// Context slice for this turn.
    pub context: &'a TurnContext,
}

/// Type-erased result of a handled request.
#[derive(Debug, Clone)]
pub struct HandlerOutcome {
    /// Extracted parameters as JSON, echoed into memory for carry-over.
    pub params: Value,
    /// Structured result as JSON.
    pub data: Value,
    /// Pre-composed message, if the service provided one.
    pub direct_message: Option<String>,
    /// Project-selection change to apply with the turn.
    pub project_update: Option<ProjectUpdate>,
}

/// Object-safe entry point the dispatcher invokes per request.
#[async_trait]
pub trait IntentHandler: Send + Sync {
    /// Runs extraction, the project-context check, and the service query.
    async fn handle(&self, request: HandlerRequest<'_>) -> Result<HandlerOutcome, HandlerError>;
}

/// Composes one extractor and one service into an `IntentHandler`.
pub struct IntentPipeline<E, S> {
    category: &'static str,
    extractor: E,
    service: S,
}

impl<E, S> IntentPipeline<E, S> {
    /// Creates a pipeline for the given intent category.
    pub fn new(category: &'static str, extractor: E, service: S) -> Self {
        Self {
            category,
            extractor,
            service,
        }
    }
}

#[async_trait]
impl<E, S> IntentHandler for IntentPipeline<E, S>
where
    E: ParamExtractor,
    S: IntentService<Params = E::Params>,
{
    async fn handle(&self, request: HandlerRequest<'_>) -> Result<HandlerOutcome, HandlerError> {
        let params = self.extractor.extract(request.query, request.context).await?;

        if E::Params::REQUIRES_PROJECT_CONTEXT
            && request.context.selected_project.is_none()
            && params.explicit_project().is_none()
        {
            tracing::debug!(intent = self.category, "refusing query without project context");
            return Err(HandlerError::ProjectContextRequired);
        }

        let outcome = self.service.query(&params, request.context).await?;

        let params = serde_json::to_value(&params)
            .map_err(|e| HandlerError::Unexpected(format!("parameter serialization: {e}")))?;
        let data = serde_json::to_value(&outcome.output)
            .map_err(|e| HandlerError::Unexpected(format!("result serialization: {e}")))?;

        Ok(HandlerOutcome {
            params,
            data,
            direct_message: outcome.direct_message,
            project_update: outcome.project_update,
        })
    }
}

/// Parameters for intents that take no input beyond the query text itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoParams {
    /// The raw query, echoed for the turn record.
    pub query: String,
}

impl IntentParams for EchoParams {}

/// Extractor for intents with nothing to extract; never calls the
/// language model.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoExtractor;

#[async_trait]
impl ParamExtractor for EchoExtractor {
    type Params = EchoParams;

    async fn extract(&self, query: &str, _ctx: &TurnContext) -> Result<EchoParams, HandlerError> {
        Ok(EchoParams {
            query: query.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationId;
    use chrono::NaiveDate;

    fn bare_context() -> TurnContext {
        TurnContext {
            conversation_id: ConversationId::new(),
            reference_date: NaiveDate::from_ymd_opt(2025, 11, 7).unwrap(),
            selected_project: None,
            previous: None,
            recent: Vec::new(),
            carry_over: None,
        }
    }

    struct UnitService;

    #[async_trait]
    impl IntentService for UnitService {
        type Params = EchoParams;
        type Output = serde_json::Value;

        async fn query(
            &self,
            params: &EchoParams,
            _ctx: &TurnContext,
        ) -> Result<ServiceOutcome<serde_json::Value>, HandlerError> {
            Ok(ServiceOutcome::new(serde_json::json!({
                "echo": params.query
            })))
        }
    }

    #[tokio::test]
    async fn pipeline_threads_params_into_outcome() {
        let pipeline = IntentPipeline::new("echo", EchoExtractor, UnitService);
        let ctx = bare_context();
        let outcome = pipeline
            .handle(HandlerRequest {
                query: "hello",
                context: &ctx,
            })
            .await
            .unwrap();

        assert_eq!(outcome.params["query"], "hello");
        assert_eq!(outcome.data["echo"], "hello");
        assert!(outcome.direct_message.is_none());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            HandlerError::MissingParameter {
                name: "person".into()
            }
            .code(),
            "missing_parameter"
        );
        assert_eq!(HandlerError::ProjectContextRequired.code(), "project_context_required");
        assert_eq!(HandlerError::Unexpected("boom".into()).code(), "unexpected");
    }

    #[test]
    fn unexpected_error_display_hides_detail() {
        let err = HandlerError::Unexpected("stack details".into());
        assert!(!err.to_string().contains("stack details"));
    }
}
