//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! dispatch core and the outside world. Adapters implement these ports.
//!
//! - `LanguageModel` - classification, structured extraction, and answer
//!   composition capabilities
//! - `WorkTracker` - structured queries against the external work-item source
//! - `ConversationStore` - per-conversation memory backing store

mod conversation_store;
mod language_model;
mod work_tracker;

pub use conversation_store::{ConversationStore, MemoryError};
pub use language_model::{
    ClassificationOutcome, ClassificationRequest, CompositionRequest, ExtractionRequest,
    FieldKind, FieldSpec, IntentChoice, LanguageModel, LanguageModelError, ParameterSchema,
};
pub use work_tracker::{WorkTracker, WorkTrackerError};
