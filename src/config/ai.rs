//! Language-model capability configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Language-model provider configuration
///
/// Covers the classification, extraction, and answer-composition capabilities
/// consumed through the `LanguageModel` port. The default values target an
/// OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// API key for the completion endpoint
    pub api_key: Option<String>,

    /// Model identifier (e.g., "gpt-4o-mini")
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the completion endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(key) = &self.api_key {
            if key.is_empty() {
                return Err(ValidationError::EmptyApiKey);
            }
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl);
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_validates() {
        assert!(AiConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_api_key_rejected() {
        let config = AiConfig {
            api_key: Some(String::new()),
            ..AiConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::EmptyApiKey)
        ));
    }

    #[test]
    fn bad_base_url_rejected() {
        let config = AiConfig {
            base_url: "ftp://nope".to_string(),
            ..AiConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBaseUrl)
        ));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = AiConfig {
            timeout_secs: 0,
            ..AiConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTimeout)
        ));
    }
}
