//! Process-wide catalog of available intents.
//!
//! The registry is populated once by an explicit bootstrap
//! ([`IntentRegistry::builtin`]) and treated as read-only afterwards; the
//! dispatcher shares it as an `Arc` and reads it without locking. Tests build
//! fresh registries instead of resetting a global.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::{LanguageModel, WorkTracker};

use super::pipeline::IntentHandler;
use super::{
    available_actions, delayed_tasks, fallback, other, placeholder, project_deselection,
    project_search, project_selection, project_team, task_list, worked_hours,
};

/// Category the router falls back to for unknown or low-confidence
/// classifications and for queries outside the tracker domain.
pub const FALLBACK_CATEGORY: &str = "fallback";

/// Errors from registry mutation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The category was already registered. Registration happens exactly once
    /// per intent module at bootstrap; hitting this indicates a packaging bug.
    #[error("Intent '{0}' is already registered")]
    DuplicateIntent(String),
}

/// Shared dependencies handed to handler factories.
///
/// Carries a snapshot of the intent catalog instead of the registry itself so
/// intents that describe the catalog (e.g. `available_actions`) need no
/// back-reference.
#[derive(Clone)]
pub struct HandlerDeps {
    /// Language-model capability.
    pub language_model: Arc<dyn LanguageModel>,
    /// Work-item tracker capability.
    pub tracker: Arc<dyn WorkTracker>,
    /// Summary of every registered intent, in registration order.
    pub catalog: Vec<IntentSummary>,
}

/// Catalog entry describing one registered intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentSummary {
    /// Registry identifier.
    pub category: String,
    /// Human-readable name.
    pub display_name: String,
    /// Description used for classification and help output.
    pub description: String,
    /// Whether the intent is fully implemented (placeholders answer with a
    /// notice instead of data).
    pub implemented: bool,
}

/// Constructs a handler for one request.
pub type HandlerFactory = Arc<dyn Fn(&HandlerDeps) -> Arc<dyn IntentHandler> + Send + Sync>;

/// Immutable record describing one intent.
#[derive(Clone)]
pub struct IntentMetadata {
    /// Unique identifier (e.g., "worked_hours").
    pub category: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Full description for the classification prompt.
    pub description: &'static str,
    /// Downstream agent handling the final answer.
    pub agent_name: String,
    /// Whether a natural-language composition pass runs over the result.
    pub requires_llm_finish: bool,
    /// Whether the intent is fully implemented.
    pub implemented: bool,
    factory: HandlerFactory,
}

impl IntentMetadata {
    /// Creates metadata with defaults: agent name `<category>_agent`, no
    /// composition pass, implemented.
    pub fn new(
        category: &'static str,
        display_name: &'static str,
        description: &'static str,
        factory: HandlerFactory,
    ) -> Self {
        Self {
            category,
            display_name,
            description,
            agent_name: format!("{category}_agent"),
            requires_llm_finish: false,
            implemented: true,
            factory,
        }
    }

    /// Overrides the downstream agent name.
    pub fn with_agent_name(mut self, agent_name: impl Into<String>) -> Self {
        self.agent_name = agent_name.into();
        self
    }

    /// Requests the natural-language composition pass after the service.
    pub fn with_llm_finish(mut self) -> Self {
        self.requires_llm_finish = true;
        self
    }

    /// Marks the intent as a registered placeholder.
    pub fn placeholder(mut self) -> Self {
        self.implemented = false;
        self
    }

    /// Constructs the handler for one request.
    pub fn handler(&self, deps: &HandlerDeps) -> Arc<dyn IntentHandler> {
        (self.factory)(deps)
    }

    /// Catalog summary for this intent.
    pub fn summary(&self) -> IntentSummary {
        IntentSummary {
            category: self.category.to_string(),
            display_name: self.display_name.to_string(),
            description: self.description.to_string(),
            implemented: self.implemented,
        }
    }
}

impl fmt::Debug for IntentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntentMetadata")
            .field("category", &self.category)
            .field("display_name", &self.display_name)
            .field("agent_name", &self.agent_name)
            .field("requires_llm_finish", &self.requires_llm_finish)
            .field("implemented", &self.implemented)
            .finish_non_exhaustive()
    }
}

/// Catalog mapping intent identifiers to metadata and handler factories.
#[derive(Debug, Default)]
pub struct IntentRegistry {
    entries: Vec<IntentMetadata>,
    index: HashMap<&'static str, usize>,
}

impl IntentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in intent.
    ///
    /// This is the bootstrap phase: it runs once at startup and the result is
    /// read-only afterwards.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for metadata in [
            worked_hours::metadata(),
            task_list::metadata(),
            delayed_tasks::metadata(),
            project_search::metadata(),
            project_selection::metadata(),
            project_deselection::metadata(),
            project_team::metadata(),
            placeholder::project_progress_metadata(),
            placeholder::daily_activities_metadata(),
            available_actions::metadata(),
            other::metadata(),
            fallback::metadata(),
        ] {
            registry
                .register(metadata)
                .expect("built-in intent categories are unique");
        }
        registry
    }

    /// Registers an intent. Fails if the category is already present.
    pub fn register(&mut self, metadata: IntentMetadata) -> Result<(), RegistryError> {
        if self.index.contains_key(metadata.category) {
            return Err(RegistryError::DuplicateIntent(metadata.category.to_string()));
        }
        self.index.insert(metadata.category, self.entries.len());
        self.entries.push(metadata);
        Ok(())
    }

    /// Looks up metadata by category. Unknown categories are `None`, never an
    /// error - routing must degrade to the fallback handler.
    pub fn get(&self, category: &str) -> Option<&IntentMetadata> {
        self.index.get(category).map(|&i| &self.entries[i])
    }

    /// All metadata in registration order.
    pub fn list_all(&self) -> &[IntentMetadata] {
        &self.entries
    }

    /// Catalog summaries in registration order.
    pub fn summaries(&self) -> Vec<IntentSummary> {
        self.entries.iter().map(IntentMetadata::summary).collect()
    }

    /// Number of registered intents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::intents::{EchoExtractor, IntentPipeline};

    fn test_metadata(category: &'static str) -> IntentMetadata {
        IntentMetadata::new(category, "Test", "A test intent", Arc::new(|_deps| {
            Arc::new(IntentPipeline::new(
                "test",
                EchoExtractor,
                crate::domain::intents::fallback::StaticMessageService::new("test"),
            ))
        }))
    }

    #[test]
    fn register_then_get_round_trips_metadata() {
        let mut registry = IntentRegistry::new();
        let metadata = test_metadata("sample")
            .with_agent_name("sample_agent")
            .with_llm_finish();
        registry.register(metadata).unwrap();

        let found = registry.get("sample").unwrap();
        assert_eq!(found.category, "sample");
        assert_eq!(found.display_name, "Test");
        assert_eq!(found.description, "A test intent");
        assert_eq!(found.agent_name, "sample_agent");
        assert!(found.requires_llm_finish);
        assert!(found.implemented);
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut registry = IntentRegistry::new();
        registry.register(test_metadata("sample")).unwrap();
        let err = registry.register(test_metadata("sample")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateIntent("sample".to_string()));
    }

    #[test]
    fn unknown_category_is_none_not_error() {
        let registry = IntentRegistry::new();
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn list_all_preserves_registration_order() {
        let mut registry = IntentRegistry::new();
        registry.register(test_metadata("first")).unwrap();
        registry.register(test_metadata("second")).unwrap();
        registry.register(test_metadata("third")).unwrap();

        let categories: Vec<_> = registry.list_all().iter().map(|m| m.category).collect();
        assert_eq!(categories, vec!["first", "second", "third"]);
    }

    #[test]
    fn builtin_includes_fallback_target() {
        let registry = IntentRegistry::builtin();
        assert!(registry.get(FALLBACK_CATEGORY).is_some());
        assert!(registry.get("worked_hours").is_some());
        assert!(registry.len() >= 10);
    }

    #[test]
    fn default_agent_name_derives_from_category() {
        let metadata = test_metadata("sample");
        assert_eq!(metadata.agent_name, "sample_agent");
    }
}
