//! Conversation state and turn history.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{Timestamp, TurnId};
use crate::domain::work::ProjectRef;

/// Change to the conversation's selected project carried by a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectUpdate {
    /// Select the given project for subsequent turns.
    Select(ProjectRef),
    /// Clear the current selection.
    Clear,
}

/// One completed request/response cycle.
///
/// Turns are only ever written whole: the dispatcher assembles the full turn
/// after the service succeeds and appends it in a single memory operation, so
/// an abandoned request leaves no partial state behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Unique turn identifier.
    pub id: TurnId,
    /// Raw user query.
    pub query: String,
    /// Intent category that handled the turn.
    pub intent: String,
    /// Extracted parameters, echoed as JSON for follow-up carry-over.
    pub params: Value,
    /// Structured result, echoed as JSON.
    pub result: Value,
    /// When the turn completed.
    pub recorded_at: Timestamp,
    /// Project-selection change made by this turn, if any.
    pub project_update: Option<ProjectUpdate>,
}

impl ConversationTurn {
    /// Creates a turn recorded at the current moment.
    pub fn new(
        query: impl Into<String>,
        intent: impl Into<String>,
        params: Value,
        result: Value,
    ) -> Self {
        Self {
            id: TurnId::new(),
            query: query.into(),
            intent: intent.into(),
            params,
            result,
            recorded_at: Timestamp::now(),
            project_update: None,
        }
    }

    /// Attaches a project-selection change to the turn.
    pub fn with_project_update(mut self, update: ProjectUpdate) -> Self {
        self.project_update = Some(update);
        self
    }
}

/// Accumulated state for one conversation id.
///
/// Created implicitly on first use; grows one turn per successful request.
/// There is no automatic eviction - deleting a conversation is an explicit
/// store operation, and bounding growth is left to the deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    turns: Vec<ConversationTurn>,
    selected_project: Option<ProjectRef>,
    /// Free-form note extractors may consult for elliptical references.
    carry_over: Option<String>,
}

impl ConversationState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded turns, oldest first.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// The most recent turn, if any.
    pub fn last_turn(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    /// Number of recorded turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turn has completed yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Currently selected project, if any.
    pub fn selected_project(&self) -> Option<&ProjectRef> {
        self.selected_project.as_ref()
    }

    /// Free-form carry-over note.
    pub fn carry_over(&self) -> Option<&str> {
        self.carry_over.as_deref()
    }

    /// Replaces the carry-over note.
    pub fn set_carry_over(&mut self, note: impl Into<String>) {
        self.carry_over = Some(note.into());
    }

    /// Appends a completed turn, applying its project update if present.
    pub fn record(&mut self, turn: ConversationTurn) {
        match &turn.project_update {
            Some(ProjectUpdate::Select(project)) => {
                self.selected_project = Some(project.clone());
            }
            Some(ProjectUpdate::Clear) => {
                self.selected_project = None;
            }
            None => {}
        }
        self.turns.push(turn);
    }
}
