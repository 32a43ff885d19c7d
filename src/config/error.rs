//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Language-model API key must not be empty when set")]
    EmptyApiKey,

    #[error("Language-model base URL must start with http:// or https://")]
    InvalidBaseUrl,

    #[error("Confidence threshold must be between 0.0 and 1.0")]
    InvalidConfidenceThreshold,

    #[error("Recent turn window must be at least 1")]
    InvalidRecentTurns,
}
