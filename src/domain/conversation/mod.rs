//! Per-conversation state: turn history, selected project, and the context
//! slice handed to extractors for follow-up resolution.

mod context;
mod state;

pub use context::{PreviousTurn, TurnContext, TurnDigest};
pub use state::{ConversationState, ConversationTurn, ProjectUpdate};
