//! The context slice handed to extractors and services for one turn.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::ConversationId;
use crate::domain::work::ProjectRef;

use super::ConversationState;

/// Compact digest of a past turn, used in classification prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnDigest {
    /// Raw user query of the past turn.
    pub query: String,
    /// Intent that handled it.
    pub intent: String,
}

/// The previous turn's data, used by extractors for parameter carry-over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviousTurn {
    /// Raw user query of the previous turn.
    pub query: String,
    /// Intent that handled it.
    pub intent: String,
    /// Parameters extracted on the previous turn.
    pub params: Value,
}

/// Everything an extractor or service may consult for one request.
///
/// Built from a state snapshot before extraction begins; the reference date
/// is supplied by the dispatcher so relative time expressions resolve
/// deterministically under test.
#[derive(Debug, Clone)]
pub struct TurnContext {
    /// Conversation this turn belongs to.
    pub conversation_id: ConversationId,
    /// "Today" for resolving relative time expressions.
    pub reference_date: NaiveDate,
    /// Project selected in earlier turns, if any.
    pub selected_project: Option<ProjectRef>,
    /// The immediately preceding turn, if any.
    pub previous: Option<PreviousTurn>,
    /// Digests of the most recent turns, oldest first.
    pub recent: Vec<TurnDigest>,
    /// Free-form carry-over note from the conversation state.
    pub carry_over: Option<String>,
}

impl TurnContext {
    /// Builds the context slice from a state snapshot.
    ///
    /// `recent_turns` bounds how many digests are included.
    pub fn from_state(
        conversation_id: ConversationId,
        state: &ConversationState,
        reference_date: NaiveDate,
        recent_turns: usize,
    ) -> Self {
        let previous = state.last_turn().map(|turn| PreviousTurn {
            query: turn.query.clone(),
            intent: turn.intent.clone(),
            params: turn.params.clone(),
        });

        let skip = state.len().saturating_sub(recent_turns);
        let recent = state
            .turns()
            .iter()
            .skip(skip)
            .map(|turn| TurnDigest {
                query: turn.query.clone(),
                intent: turn.intent.clone(),
            })
            .collect();

        Self {
            conversation_id,
            reference_date,
            selected_project: state.selected_project().cloned(),
            previous,
            recent,
            carry_over: state.carry_over().map(str::to_string),
        }
    }

    /// A previous-turn parameter by name, for carry-over fills.
    pub fn previous_param(&self, name: &str) -> Option<&Value> {
        self.previous
            .as_ref()
            .and_then(|turn| turn.params.get(name))
            .filter(|value| !value.is_null())
    }

    /// Formats the context for inclusion in an extraction prompt.
    pub fn prompt_summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(project) = &self.selected_project {
            parts.push(format!("Selected project: {}", project.name));
        }
        if let Some(previous) = &self.previous {
            parts.push(format!("Previous query: {}", previous.query));
            parts.push(format!("Previous intent: {}", previous.intent));
            parts.push(format!("Previous parameters: {}", previous.params));
        }
        if let Some(note) = &self.carry_over {
            parts.push(format!("Note: {note}"));
        }
        if parts.is_empty() {
            "No previous context available.".to_string()
        } else {
            parts.join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::ConversationTurn;
    use serde_json::json;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 7).unwrap()
    }

    #[test]
    fn empty_state_yields_bare_context() {
        let state = ConversationState::new();
        let ctx = TurnContext::from_state(ConversationId::new(), &state, reference(), 3);
        assert!(ctx.previous.is_none());
        assert!(ctx.recent.is_empty());
        assert_eq!(ctx.prompt_summary(), "No previous context available.");
    }

    #[test]
    fn previous_param_skips_null_fields() {
        let mut state = ConversationState::new();
        state.record(ConversationTurn::new(
            "hours for Alice",
            "worked_hours",
            json!({"person": "Alice", "project": null}),
            json!({}),
        ));
        let ctx = TurnContext::from_state(ConversationId::new(), &state, reference(), 3);

        assert_eq!(ctx.previous_param("person"), Some(&json!("Alice")));
        assert!(ctx.previous_param("project").is_none());
        assert!(ctx.previous_param("missing").is_none());
    }

    #[test]
    fn carry_over_note_reaches_the_prompt_summary() {
        let mut state = ConversationState::new();
        state.set_carry_over("user prefers numbers in hours, not days");
        let ctx = TurnContext::from_state(ConversationId::new(), &state, reference(), 3);
        assert!(ctx.prompt_summary().contains("prefers numbers"));
    }

    #[test]
    fn recent_digests_are_bounded_and_ordered() {
        let mut state = ConversationState::new();
        for i in 0..5 {
            state.record(ConversationTurn::new(
                format!("query {i}"),
                "task_list",
                json!({}),
                json!({}),
            ));
        }
        let ctx = TurnContext::from_state(ConversationId::new(), &state, reference(), 3);
        assert_eq!(ctx.recent.len(), 3);
        assert_eq!(ctx.recent[0].query, "query 2");
        assert_eq!(ctx.recent[2].query, "query 4");
    }
}
