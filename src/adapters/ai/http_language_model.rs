//! HTTP Language Model - `LanguageModel` port over an OpenAI-compatible API.
//!
//! Maps the three capabilities onto chat completions: classification and
//! extraction ask for a JSON object and parse the reply; composition returns
//! the content verbatim. Transient transport failures are retried a bounded
//! number of times before one typed error is surfaced.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpLanguageModelConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let model = HttpLanguageModel::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    ClassificationOutcome, ClassificationRequest, CompositionRequest, ExtractionRequest,
    FieldKind, LanguageModel, LanguageModelError, ParameterSchema,
};

/// Configuration for the HTTP language-model adapter.
#[derive(Debug, Clone)]
pub struct HttpLanguageModelConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "gpt-4o-mini").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl HttpLanguageModelConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }

    /// Builds a configuration from the application config.
    pub fn from_app_config(config: &crate::config::AiConfig) -> Self {
        Self {
            api_key: Secret::new(config.api_key.clone().unwrap_or_default()),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
            max_retries: config.max_retries,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI-compatible adapter for the `LanguageModel` port.
pub struct HttpLanguageModel {
    config: HttpLanguageModelConfig,
    client: Client,
}

impl HttpLanguageModel {
    /// Creates a new adapter with the given configuration.
    pub fn new(config: HttpLanguageModelConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Runs one chat completion, retrying transient failures.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        json_output: bool,
    ) -> Result<String, LanguageModelError> {
        let mut last_error = LanguageModelError::network("No attempts made");

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                // Exponential backoff between attempts.
                sleep(Duration::from_millis(250 * (1 << attempt.min(4)))).await;
            }

            match self
                .try_complete(system_prompt, user_prompt, temperature, json_output)
                .await
            {
                Ok(content) => return Ok(content),
                Err(err) if err.is_transient() => {
                    tracing::warn!(attempt, error = %err, "language model call failed, retrying");
                    last_error = err;
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_error)
    }

    async fn try_complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        json_output: bool,
    ) -> Result<String, LanguageModelError> {
        let request = WireRequest {
            model: self.config.model.clone(),
            messages: vec![
                WireMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                WireMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            temperature,
            response_format: json_output.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LanguageModelError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    LanguageModelError::network(format!("Connection failed: {e}"))
                } else {
                    LanguageModelError::network(e.to_string())
                }
            })?;

        let response = self.handle_response_status(response).await?;

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| LanguageModelError::invalid_response(format!("body parse: {e}")))?;

        wire.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LanguageModelError::invalid_response("no choices in response"))
    }

    async fn handle_response_status(
        &self,
        response: Response,
    ) -> Result<Response, LanguageModelError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(LanguageModelError::AuthenticationFailed),
            429 => Err(LanguageModelError::RateLimited {
                retry_after_secs: 30,
            }),
            400..=499 => Err(LanguageModelError::invalid_response(format!(
                "status {status}: {error_body}"
            ))),
            _ => Err(LanguageModelError::unavailable(format!(
                "status {status}: {error_body}"
            ))),
        }
    }

    /// Parses a JSON object out of a completion reply, tolerating markdown
    /// code fences some models wrap objects in.
    fn parse_json_content(content: &str) -> Result<Value, LanguageModelError> {
        let trimmed = content.trim();
        let stripped = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .and_then(|rest| rest.strip_suffix("```"))
            .map(str::trim)
            .unwrap_or(trimmed);

        serde_json::from_str(stripped)
            .map_err(|e| LanguageModelError::invalid_response(format!("JSON parse: {e}")))
    }

    fn render_schema(schema: &ParameterSchema) -> String {
        schema
            .fields
            .iter()
            .map(|field| {
                let kind = match &field.kind {
                    FieldKind::Text => "string".to_string(),
                    FieldKind::Number => "number".to_string(),
                    FieldKind::Date => "date (YYYY-MM-DD)".to_string(),
                    FieldKind::Flag => "boolean".to_string(),
                    FieldKind::TextList => "list of strings".to_string(),
                    FieldKind::OneOf(values) => format!("one of [{}]", values.join(", ")),
                };
                let requirement = if field.required { "required" } else { "or null" };
                format!("- {} ({kind}, {requirement}): {}", field.name, field.description)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
    async fn classify(
        &self,
        request: ClassificationRequest,
    ) -> Result<ClassificationOutcome, LanguageModelError> {
        let choices = request
            .choices
            .iter()
            .map(|choice| format!("- {}: {}", choice.identifier, choice.description))
            .collect::<Vec<_>>()
            .join("\n");

        let recent = if request.recent_turns.is_empty() {
            "No previous conversation.".to_string()
        } else {
            request
                .recent_turns
                .iter()
                .map(|turn| format!("User: {}\nIntent: {}", turn.query, turn.intent))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let project = request
            .selected_project
            .as_deref()
            .unwrap_or("No project selected");

        let user_prompt = format!(
            "Classify the user query into exactly one of these categories.\n\n\
             Current project: {project}\n\n\
             Recent conversation:\n{recent}\n\n\
             Categories:\n{choices}\n\n\
             Reply with a JSON object: {{\"identifier\": <category>, \
             \"confidence\": <0.0-1.0>, \"reasoning\": <short explanation>}}\n\n\
             User query: {}",
            request.query
        );

        let content = self
            .complete(
                "You are an intent classification assistant.",
                &user_prompt,
                0.3,
                true,
            )
            .await?;

        let value = Self::parse_json_content(&content)?;
        serde_json::from_value(value)
            .map_err(|e| LanguageModelError::invalid_response(format!("classification: {e}")))
    }

    async fn extract(&self, request: ExtractionRequest) -> Result<Value, LanguageModelError> {
        let schema = Self::render_schema(&request.schema);

        let user_prompt = format!(
            "{}\n\nCurrent date for reference: {}\n\n\
             Context from previous conversation:\n{}\n\n\
             Return a JSON object with exactly these fields:\n{schema}\n\n\
             User query: {}",
            request.instructions, request.reference_date, request.context, request.query
        );

        let content = self
            .complete(
                "You are a parameter extraction assistant. Extract information accurately.",
                &user_prompt,
                0.1,
                true,
            )
            .await?;

        Self::parse_json_content(&content)
    }

    async fn compose(&self, request: CompositionRequest) -> Result<String, LanguageModelError> {
        let context = request
            .context
            .as_deref()
            .unwrap_or("No previous context.");

        let user_prompt = format!(
            "User question: {}\n\nQuery type: {}\n\nConversation context:\n{context}\n\n\
             Data retrieved:\n{}\n\n\
             Write a clear, concise answer for the user based on the data. If the data \
             is empty, say so politely. Answer only the question asked.",
            request.query, request.intent, request.data
        );

        self.complete(
            "You are an assistant that writes natural-language answers over structured \
             work-tracking data. Do not mention the underlying data source.",
            &user_prompt,
            0.5,
            false,
        )
        .await
    }
}

// OpenAI-compatible wire format.

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FieldSpec;

    #[test]
    fn parse_json_content_handles_plain_objects() {
        let value = HttpLanguageModel::parse_json_content(r#"{"identifier": "worked_hours"}"#)
            .unwrap();
        assert_eq!(value["identifier"], "worked_hours");
    }

    #[test]
    fn parse_json_content_strips_code_fences() {
        let content = "```json\n{\"person\": \"Alice\"}\n```";
        let value = HttpLanguageModel::parse_json_content(content).unwrap();
        assert_eq!(value["person"], "Alice");
    }

    #[test]
    fn parse_json_content_rejects_prose() {
        assert!(HttpLanguageModel::parse_json_content("sure, here you go").is_err());
    }

    #[test]
    fn schema_rendering_names_every_field() {
        let schema = ParameterSchema::new(
            "worked_hours",
            vec![
                FieldSpec::optional("person", FieldKind::Text, "Person name"),
                FieldSpec::required("start_date", FieldKind::Date, "Range start"),
            ],
        );
        let rendered = HttpLanguageModel::render_schema(&schema);
        assert!(rendered.contains("person"));
        assert!(rendered.contains("start_date"));
        assert!(rendered.contains("required"));
    }
}
