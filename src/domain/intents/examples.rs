//! Example prompts intents may register for classification testing.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{project_search, project_selection, task_list, worked_hours};

static BUILTIN: Lazy<ExamplesCatalog> = Lazy::new(ExamplesCatalog::builtin);

/// Shared read-only catalog of the built-in intents' examples.
pub fn builtin_catalog() -> &'static ExamplesCatalog {
    &BUILTIN
}

/// Example prompt for one intent category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplePrompt {
    /// Intent category the prompt should classify to.
    pub category: String,
    /// The prompt text.
    pub prompt: String,
}

/// Catalog of example prompts, keyed by intent category.
///
/// Optional per intent; used by classification tests to check the router's
/// option set against realistic queries.
#[derive(Debug, Clone, Default)]
pub struct ExamplesCatalog {
    entries: Vec<ExamplePrompt>,
}

impl ExamplesCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the examples shipped by the built-in intents.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(worked_hours::CATEGORY, worked_hours::examples());
        catalog.register(task_list::CATEGORY, task_list::examples());
        catalog.register(project_search::CATEGORY, project_search::examples());
        catalog.register(project_selection::CATEGORY, project_selection::examples());
        catalog
    }

    /// Registers example prompts for a category.
    pub fn register(&mut self, category: &str, prompts: &[&str]) {
        self.entries.extend(prompts.iter().map(|prompt| ExamplePrompt {
            category: category.to_string(),
            prompt: (*prompt).to_string(),
        }));
    }

    /// All prompts registered for a category.
    pub fn for_category(&self, category: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .map(|e| e.prompt.as_str())
            .collect()
    }

    /// Every registered example.
    pub fn all(&self) -> &[ExamplePrompt] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::intents::IntentRegistry;

    #[test]
    fn builtin_examples_reference_registered_intents() {
        let registry = IntentRegistry::builtin();
        let catalog = ExamplesCatalog::builtin();
        assert!(!catalog.all().is_empty());
        for example in catalog.all() {
            assert!(
                registry.get(&example.category).is_some(),
                "example references unregistered intent '{}'",
                example.category
            );
        }
    }

    #[test]
    fn shared_catalog_is_built_once() {
        let first = builtin_catalog();
        let second = builtin_catalog();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.all().len(), ExamplesCatalog::builtin().all().len());
    }

    #[test]
    fn for_category_filters() {
        let mut catalog = ExamplesCatalog::new();
        catalog.register("a", &["one", "two"]);
        catalog.register("b", &["three"]);
        assert_eq!(catalog.for_category("a"), vec!["one", "two"]);
        assert_eq!(catalog.for_category("b"), vec!["three"]);
        assert!(catalog.for_category("c").is_empty());
    }
}
