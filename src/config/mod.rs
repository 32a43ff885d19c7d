//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment
//! variables using the `config` and `dotenvy` crates. Configuration is loaded
//! with the `WORKLENS` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use worklens::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Routing threshold: {}", config.routing.confidence_threshold);
//! ```

mod ai;
mod error;
mod routing;
mod tracker;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use routing::RoutingConfig;
pub use tracker::TrackerConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the Worklens dispatch core.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Language-model capability configuration
    #[serde(default)]
    pub ai: AiConfig,

    /// Work-item tracker configuration
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Router/classifier configuration
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `WORKLENS` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `WORKLENS__AI__MODEL=gpt-4o-mini` -> `ai.model = gpt-4o-mini`
    /// - `WORKLENS__ROUTING__CONFIDENCE_THRESHOLD=0.5` -> `routing.confidence_threshold = 0.5`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("WORKLENS")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.tracker.validate()?;
        self.routing.validate()?;
        Ok(())
    }
}
