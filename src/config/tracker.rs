//! Work-item tracker configuration

use serde::Deserialize;

use super::error::ValidationError;

/// External work-item data source configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TrackerConfig {
    /// Base URL of the tracker API, when a remote adapter is wired in
    pub base_url: Option<String>,

    /// Project scope applied when a conversation has not selected one
    pub default_project: Option<String>,
}

impl TrackerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidBaseUrl);
            }
        }
        Ok(())
    }
}
