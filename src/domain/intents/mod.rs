//! Intent dispatch core: the registry of pluggable intents, the
//! extractor/service pipeline contract, and the built-in intent modules.
//!
//! Adding an intent touches nothing outside its own module: implement
//! `ParamExtractor` and `IntentService`, compose them with `IntentPipeline`,
//! and register the module's metadata during bootstrap.

mod examples;
mod pipeline;
mod registry;

pub mod available_actions;
pub mod delayed_tasks;
pub mod fallback;
pub mod other;
pub mod placeholder;
pub mod project_deselection;
pub mod project_search;
pub mod project_selection;
pub mod project_team;
pub mod task_list;
pub mod worked_hours;

pub use examples::{builtin_catalog, ExamplePrompt, ExamplesCatalog};
pub use pipeline::{
    EchoExtractor, EchoParams, HandlerError, HandlerOutcome, HandlerRequest, IntentHandler,
    IntentParams, IntentPipeline, IntentService, ParamExtractor, ServiceOutcome,
};
pub use registry::{
    HandlerDeps, HandlerFactory, IntentMetadata, IntentRegistry, IntentSummary, RegistryError,
    FALLBACK_CATEGORY,
};
