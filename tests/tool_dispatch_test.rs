// ABOUTME: Integration tests for tool registry dispatch against a real SQLite workspace
// ABOUTME: Verifies fail-closed dispatch, argument handling, limits, and owner scoping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use agenda_assistant::database::Database;
use agenda_assistant::models::TaskStatus;
use agenda_assistant::tools::{ToolExecutionContext, ToolRegistry};
use agenda_assistant::workspace::{TaskFilter, WorkspaceStore};
use chrono::{TimeZone, Utc};
use chrono_tz::Europe::Rome;
use common::init_test_logging;
use serde_json::json;
use uuid::Uuid;

struct Fixture {
    registry: ToolRegistry,
    database: Database,
    context: ToolExecutionContext,
}

async fn fixture() -> Fixture {
    init_test_logging();
    let database = Database::in_memory().await.unwrap();
    // Monday 2026-10-19, 10:00 in Rome
    let now = Rome
        .with_ymd_and_hms(2026, 10, 19, 10, 0, 0)
        .unwrap()
        .with_timezone(&Utc);
    let context = ToolExecutionContext::new(Uuid::new_v4(), Rome, Arc::new(database.workspace()))
        .with_now(now);
    Fixture {
        registry: ToolRegistry::with_builtin_tools(),
        database,
        context,
    }
}

#[tokio::test]
async fn test_catalog_is_complete_and_well_formed() {
    let f = fixture().await;
    let definitions = f.registry.definitions();
    assert_eq!(definitions.len(), 9);

    let names: HashSet<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
    for expected in [
        "create_task",
        "create_event",
        "create_note",
        "create_project",
        "query_entities",
        "search_entities",
        "update_task",
        "delete_entity",
        "get_statistics",
    ] {
        assert!(names.contains(expected), "missing {expected}");
    }
    for definition in &definitions {
        assert_eq!(definition.parameters["type"], "object");
        assert!(!definition.description.is_empty());
    }
}

#[tokio::test]
async fn test_unknown_tool_fails_closed() {
    let f = fixture().await;
    let result = f
        .registry
        .dispatch("drop_database", "{}", &f.context)
        .await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("drop_database"));
}

#[tokio::test]
async fn test_malformed_arguments_fail_closed() {
    let f = fixture().await;
    let result = f
        .registry
        .dispatch("create_task", "{\"tasks\": [", &f.context)
        .await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("arguments"));

    let tasks = f
        .database
        .workspace()
        .list_tasks(f.context.owner_id, &TaskFilter::default(), 10)
        .await
        .unwrap();
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn test_blank_arguments_mean_empty_object() {
    let f = fixture().await;
    let result = f.registry.dispatch("get_statistics", "  ", &f.context).await;
    assert!(result.success);
    assert_eq!(result.data.unwrap()["metric"], "overview");
}

#[tokio::test]
async fn test_unknown_metric_lists_catalog() {
    let f = fixture().await;
    let result = f
        .registry
        .dispatch("get_statistics", r#"{"metric":"bogus_metric"}"#, &f.context)
        .await;
    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.contains("bogus_metric"));
    assert!(error.contains("completed_today"));
}

#[tokio::test]
async fn test_query_limit_is_clamped() {
    let f = fixture().await;
    let tasks: Vec<_> = (0..60).map(|i| json!({ "title": format!("Task {i}") })).collect();
    let created = f
        .registry
        .dispatch("create_task", &json!({ "tasks": tasks }).to_string(), &f.context)
        .await;
    assert!(created.success);
    assert_eq!(created.data.unwrap()["created"], 60);

    let result = f
        .registry
        .dispatch(
            "query_entities",
            r#"{"kind":"tasks","limit":1000}"#,
            &f.context,
        )
        .await;
    assert!(result.success);
    let data = result.data.unwrap();
    assert_eq!(data["count"], 50);
    assert_eq!(data["items"].as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn test_identifier_reference_skips_search() {
    let f = fixture().await;
    let missing = Uuid::new_v4();
    let result = f
        .registry
        .dispatch(
            "update_task",
            &json!({ "task": missing, "status": "done" }).to_string(),
            &f.context,
        )
        .await;
    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("No task found"));
}

#[tokio::test]
async fn test_ambiguous_update_writes_nothing() {
    let f = fixture().await;
    f.registry
        .dispatch(
            "create_task",
            r#"{"tasks":[{"title":"Foo"},{"title":"Foo"}]}"#,
            &f.context,
        )
        .await;

    let result = f
        .registry
        .dispatch("update_task", r#"{"task":"Foo","status":"done"}"#, &f.context)
        .await;
    assert!(!result.success);
    assert_eq!(result.data.unwrap()["matches"].as_array().unwrap().len(), 2);

    let tasks = f
        .database
        .workspace()
        .list_tasks(f.context.owner_id, &TaskFilter::default(), 10)
        .await
        .unwrap();
    assert_eq!(tasks.len(), 2);
    for task in &tasks {
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(task.completed_at.is_none());
    }
}

#[tokio::test]
async fn test_batch_item_with_ambiguous_project_lists_matches() {
    let f = fixture().await;
    for name in ["Casa vecchia", "Casa nuova"] {
        let created = f
            .registry
            .dispatch(
                "create_project",
                &json!({ "name": name }).to_string(),
                &f.context,
            )
            .await;
        assert!(created.success);
    }

    let result = f
        .registry
        .dispatch(
            "create_task",
            r#"{"tasks":[{"title":"Pulire","project":"casa"}]}"#,
            &f.context,
        )
        .await;
    assert!(!result.success);
    let data = result.data.unwrap();
    assert_eq!(data["created"], 0);
    let matches = data["errors"][0]["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m["id"].is_string()));
}

#[tokio::test]
async fn test_update_then_statistics() {
    let f = fixture().await;
    f.registry
        .dispatch(
            "create_task",
            r#"{"tasks":[{"title":"Pay rent","due_date":"2026-10-18"},{"title":"Water plants"}]}"#,
            &f.context,
        )
        .await;

    let overdue = f
        .registry
        .dispatch("get_statistics", r#"{"metric":"overdue_tasks"}"#, &f.context)
        .await;
    assert!(overdue.success);
    assert_eq!(overdue.data.unwrap()["value"]["count"], 1);

    let updated = f
        .registry
        .dispatch(
            "update_task",
            r#"{"task":"rent","status":"completed"}"#,
            &f.context,
        )
        .await;
    assert!(updated.success);
    assert!(updated.data.unwrap()["completed_at"].is_string());
}

#[tokio::test]
async fn test_other_owners_data_is_invisible() {
    let f = fixture().await;
    f.registry
        .dispatch(
            "create_note",
            r#"{"title":"Private diary","content":"..."}"#,
            &f.context,
        )
        .await;

    let stranger = ToolExecutionContext::new(
        Uuid::new_v4(),
        Rome,
        Arc::new(f.database.workspace()),
    );
    let search = f
        .registry
        .dispatch("search_entities", r#"{"query":"diary"}"#, &stranger)
        .await;
    assert!(search.success);
    assert_eq!(search.data.unwrap()["count"], 0);

    let delete = f
        .registry
        .dispatch(
            "delete_entity",
            r#"{"kind":"note","reference":"diary"}"#,
            &stranger,
        )
        .await;
    assert!(!delete.success);

    let mine = f
        .registry
        .dispatch("search_entities", r#"{"query":"diary"}"#, &f.context)
        .await;
    assert_eq!(mine.data.unwrap()["count"], 1);
}
