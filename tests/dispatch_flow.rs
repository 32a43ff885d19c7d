//! Integration tests for the intent dispatch flow.
//!
//! These tests drive the full pipeline end to end:
//! 1. Router classifies the query against the built-in registry
//! 2. The intent's extractor and service run against scripted capabilities
//! 3. The answer pass runs (or the direct message is used)
//! 4. Memory records the turn and feeds the next one
//!
//! The language model is scripted and the tracker is in-memory, so every run
//! is deterministic; what is under test is the dispatch core itself.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;

use worklens::adapters::ai::ScriptedLanguageModel;
use worklens::adapters::memory::InMemoryConversationStore;
use worklens::adapters::tracker::InMemoryWorkTracker;
use worklens::application::Dispatcher;
use worklens::config::RoutingConfig;
use worklens::domain::foundation::Timestamp;
use worklens::domain::intents::IntentRegistry;
use worklens::domain::work::{ProjectRef, WorkItemKind, WorkItemRecord, WorkItemState};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Friday 2025-11-07; "this week" is Nov 3-9, "last month" is October.
fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 7).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> Timestamp {
    Timestamp::from_datetime(
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            .and_utc(),
    )
}

fn item(
    id: u64,
    kind: WorkItemKind,
    title: &str,
    assignee: Option<&str>,
    hours: Option<f64>,
    updated: Timestamp,
) -> WorkItemRecord {
    WorkItemRecord {
        id,
        title: title.to_string(),
        kind,
        state: WorkItemState::Active,
        assignee: assignee.map(str::to_string),
        project: Some(ProjectRef::new("10", "Delta Platform")),
        completed_hours: hours,
        estimated_hours: None,
        target_date: None,
        created_at: updated,
        updated_at: updated,
        tags: Vec::new(),
        parent_id: None,
    }
}

/// Tracker fixture: Alice and Bob log hours in November and October; the
/// "Delta Platform" epic (id 10) is the selectable project, and the tasks
/// carry a project reference back to it.
fn fixture_tracker() -> Arc<InMemoryWorkTracker> {
    Arc::new(InMemoryWorkTracker::with_items(vec![
        item(1, WorkItemKind::Task, "Build ingestion", Some("Alice Martins"), Some(2.5), day(2025, 11, 4)),
        item(2, WorkItemKind::Task, "Review pipeline", Some("Alice Martins"), Some(1.25), day(2025, 11, 5)),
        item(3, WorkItemKind::Task, "October cleanup", Some("Alice Martins"), Some(6.0), day(2025, 10, 14)),
        item(4, WorkItemKind::Task, "Deploy fix", Some("Bob Costa"), Some(8.0), day(2025, 11, 5)),
        item(10, WorkItemKind::Epic, "Delta Platform", None, None, day(2025, 10, 1)),
    ]))
}

fn dispatcher(model: ScriptedLanguageModel, tracker: Arc<InMemoryWorkTracker>) -> Dispatcher {
    init_tracing();
    Dispatcher::new(
        Arc::new(IntentRegistry::builtin()),
        Arc::new(model),
        tracker,
        Arc::new(InMemoryConversationStore::new()),
        RoutingConfig::default(),
    )
    .with_reference_date(reference_date())
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn worked_hours_query_without_conversation_id() {
    let model = ScriptedLanguageModel::new()
        .with_classification("worked_hours", 0.93)
        .with_extraction(json!({
            "person": "Alice",
            "start_date": "2025-11-03",
            "end_date": "2025-11-09",
            "project": null
        }))
        .with_composition("Alice trabalhou 3.8 horas esta semana.");
    let dispatcher = dispatcher(model, fixture_tracker());

    let reply = dispatcher
        .handle_query("Quantas horas trabalhou Alice esta semana?", None)
        .await;

    assert!(reply.error.is_none());
    assert_eq!(reply.intent, "worked_hours");
    // 2.5 + 1.25 rounds to one decimal.
    let data = reply.data.as_ref().unwrap();
    assert_eq!(data["person"], "Alice");
    assert_eq!(data["total_hours"], 3.8);
    assert_eq!(reply.message, "Alice trabalhou 3.8 horas esta semana.");
    // The generated conversation id is returned for follow-ups.
    assert!(!reply.conversation_id.to_string().is_empty());
}

#[tokio::test]
async fn follow_up_reuses_person_and_shifts_the_period() {
    let model = ScriptedLanguageModel::new()
        // Turn 1: full query.
        .with_classification("worked_hours", 0.93)
        .with_extraction(json!({
            "person": "Alice",
            "start_date": "2025-11-03",
            "end_date": "2025-11-09",
            "project": null
        }))
        .with_composition("3.8 hours this week.")
        // Turn 2: "and last month?" - the capability resolves the period but
        // no person is restated; the extractor must carry Alice over.
        .with_classification("worked_hours", 0.88)
        .with_extraction(json!({
            "person": null,
            "start_date": "2025-10-01",
            "end_date": "2025-10-31",
            "project": null
        }))
        .with_composition("6 hours in October.");
    let dispatcher = dispatcher(model, fixture_tracker());

    let first = dispatcher
        .handle_query("Quantas horas trabalhou Alice esta semana?", None)
        .await;
    assert!(first.error.is_none());

    let second = dispatcher
        .handle_query("e no mes passado?", Some(first.conversation_id))
        .await;

    assert!(second.error.is_none());
    let data = second.data.as_ref().unwrap();
    assert_eq!(data["person"], "Alice");
    assert_eq!(data["start_date"], "2025-10-01");
    assert_eq!(data["end_date"], "2025-10-31");
    assert_eq!(data["total_hours"], 6.0);
}

#[tokio::test]
async fn project_selection_enables_team_queries_and_deselection_clears() {
    let model = ScriptedLanguageModel::new()
        // Turn 1: team query before any selection - must be refused.
        .with_classification("project_team", 0.9)
        // Turn 2: select the project.
        .with_classification("project_selection", 0.95)
        .with_extraction(json!({"project_name": "Delta"}))
        // Turn 3: team query now succeeds.
        .with_classification("project_team", 0.9)
        .with_composition("Alice and Bob work on Delta Platform.")
        // Turn 4: deselect.
        .with_classification("project_deselection", 0.97);
    let dispatcher = dispatcher(model, fixture_tracker());

    let refused = dispatcher.handle_query("who is on the team?", None).await;
    assert_eq!(refused.error.as_deref(), Some("project_context_required"));
    let id = refused.conversation_id;

    let selected = dispatcher.handle_query("select the Delta project", Some(id)).await;
    assert!(selected.error.is_none());
    assert_eq!(selected.selected_project.as_deref(), Some("Delta Platform"));

    let team = dispatcher.handle_query("who is on the team?", Some(id)).await;
    assert!(team.error.is_none());
    let members = team.data.as_ref().unwrap()["members"].as_array().unwrap();
    let names: Vec<_> = members.iter().map(|m| m["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Alice Martins", "Bob Costa"]);

    let deselected = dispatcher.handle_query("deselect the project", Some(id)).await;
    assert!(deselected.error.is_none());
    assert!(deselected.selected_project.is_none());
}

#[tokio::test]
async fn unknown_classification_routes_to_fallback_not_an_error() {
    let model = ScriptedLanguageModel::new().with_classification("totally_made_up", 0.99);
    let dispatcher = dispatcher(model, fixture_tracker());

    let reply = dispatcher.handle_query("do something weird", None).await;
    assert!(reply.error.is_none());
    assert_eq!(reply.intent, "fallback");
    assert!(reply.message.contains("work-item tracking"));
}

#[tokio::test]
async fn clear_resets_a_conversation_to_fresh_state() {
    let model = ScriptedLanguageModel::new()
        .with_classification("available_actions", 0.95)
        // After the clear, the follow-up sees no context; classify again.
        .with_classification("available_actions", 0.95);
    let dispatcher = dispatcher(model, fixture_tracker());

    let first = dispatcher.handle_query("what can you do?", None).await;
    let id = first.conversation_id;
    assert!(dispatcher.list_conversations().await.contains(&id));

    assert!(dispatcher.clear(&id).await);
    assert!(!dispatcher.list_conversations().await.contains(&id));
    // Clearing twice reports nothing to delete.
    assert!(!dispatcher.clear(&id).await);

    // Reusing the id starts from a fresh state rather than old history.
    let again = dispatcher.handle_query("help", Some(id)).await;
    assert!(again.error.is_none());
    assert_eq!(again.conversation_id, id);
}

#[tokio::test]
async fn selection_survives_unrelated_turns() {
    let model = ScriptedLanguageModel::new()
        .with_classification("project_selection", 0.95)
        .with_extraction(json!({"project_name": "Delta"}))
        .with_classification("worked_hours", 0.9)
        .with_extraction(json!({
            "person": "Bob",
            "start_date": "2025-11-03",
            "end_date": "2025-11-09",
            "project": null
        }))
        .with_composition("Bob logged 8 hours.");
    let dispatcher = dispatcher(model, fixture_tracker());

    let selected = dispatcher.handle_query("work on Delta", None).await;
    let id = selected.conversation_id;
    assert_eq!(selected.selected_project.as_deref(), Some("Delta Platform"));

    // The hours turn does not touch the selection but still reports it.
    let hours = dispatcher.handle_query("horas do Bob esta semana", Some(id)).await;
    assert!(hours.error.is_none());
    assert_eq!(hours.selected_project.as_deref(), Some("Delta Platform"));
    assert_eq!(hours.data.as_ref().unwrap()["project"], "Delta Platform");
}
