//! Language-model adapters.

mod http_language_model;
mod scripted;

pub use http_language_model::{HttpLanguageModel, HttpLanguageModelConfig};
pub use scripted::ScriptedLanguageModel;
