// ABOUTME: Integration tests for the SQLite conversation store and usage ledger
// ABOUTME: Exercises persistence across reconnects, append order, and atomic turn writes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use agenda_assistant::database::{Database, TurnRecord};
use agenda_assistant::errors::ErrorCode;
use agenda_assistant::models::{MessageRecord, StoredRole, ToolResult, ToolUsage, UsageRecord};
use chrono::Utc;
use common::init_test_logging;
use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("agenda.db").display())
}

fn turn(conversation_id: Uuid, owner_id: Uuid, title: Option<&str>, text: &str) -> TurnRecord {
    TurnRecord {
        conversation_id,
        owner_id,
        new_title: title.map(str::to_owned),
        user_message: MessageRecord::user(text),
        assistant_message: MessageRecord::assistant(
            format!("re: {text}"),
            vec![ToolUsage {
                name: "create_note".to_owned(),
                result: ToolResult::ok(json!({ "note": { "title": text } })),
            }],
        ),
        usage: UsageRecord {
            id: Uuid::new_v4(),
            owner_id,
            conversation_id,
            model: "test-model".to_owned(),
            input_tokens: 100,
            output_tokens: 10,
            created_at: Utc::now(),
        },
    }
}

#[tokio::test]
async fn test_conversation_survives_reconnect() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);
    let owner_id = Uuid::new_v4();
    let conversation_id = Uuid::new_v4();

    {
        let database = Database::new(&url).await.unwrap();
        let chat = database.chat();
        chat.persist_turn(&turn(conversation_id, owner_id, Some("Notes"), "one"))
            .await
            .unwrap();
        chat.persist_turn(&turn(conversation_id, owner_id, None, "two"))
            .await
            .unwrap();
        database.pool().close().await;
    }

    let database = Database::new(&url).await.unwrap();
    let conversation = database
        .chat()
        .load_conversation(conversation_id, owner_id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(conversation.title, "Notes");
    let contents: Vec<&str> = conversation
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, vec!["one", "re: one", "two", "re: two"]);
    assert_eq!(conversation.messages[0].role, StoredRole::User);

    let tools = conversation.messages[1].tools_used.as_ref().unwrap();
    assert_eq!(tools[0].name, "create_note");
    assert!(tools[0].result.success);
    assert_eq!(tools[0].result.data.as_ref().unwrap()["note"]["title"], "one");

    let usage = database.usage().summary(owner_id).await.unwrap();
    assert_eq!(usage.turns, 2);
    assert_eq!(usage.total_tokens, 220);
}

#[tokio::test]
async fn test_turn_on_missing_conversation_writes_nothing() {
    init_test_logging();
    let database = Database::in_memory().await.unwrap();
    let owner_id = Uuid::new_v4();
    let conversation_id = Uuid::new_v4();

    let err = database
        .chat()
        .persist_turn(&turn(conversation_id, owner_id, None, "orphan"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    assert!(database
        .chat()
        .get_messages(conversation_id)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(database.usage().summary(owner_id).await.unwrap().turns, 0);
}

#[tokio::test]
async fn test_recent_messages_keep_append_order() {
    init_test_logging();
    let database = Database::in_memory().await.unwrap();
    let chat = database.chat();
    let owner_id = Uuid::new_v4();
    let conversation_id = Uuid::new_v4();

    chat.persist_turn(&turn(conversation_id, owner_id, Some("Long"), "a"))
        .await
        .unwrap();
    for text in ["b", "c"] {
        chat.persist_turn(&turn(conversation_id, owner_id, None, text))
            .await
            .unwrap();
    }

    let recent = chat.get_recent_messages(conversation_id, 3).await.unwrap();
    let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["re: b", "c", "re: c"]);
}

#[tokio::test]
async fn test_replace_messages_overwrites_sequence() {
    init_test_logging();
    let database = Database::in_memory().await.unwrap();
    let chat = database.chat();
    let owner_id = Uuid::new_v4();
    let conversation_id = Uuid::new_v4();

    chat.persist_turn(&turn(conversation_id, owner_id, Some("Draft"), "first"))
        .await
        .unwrap();
    chat.replace_messages(
        conversation_id,
        owner_id,
        &[MessageRecord::user("only this")],
    )
    .await
    .unwrap();

    let messages = chat.get_messages(conversation_id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "only this");

    let err = chat
        .replace_messages(conversation_id, Uuid::new_v4(), &[])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_delete_keeps_usage_rows() {
    init_test_logging();
    let database = Database::in_memory().await.unwrap();
    let chat = database.chat();
    let owner_id = Uuid::new_v4();
    let conversation_id = Uuid::new_v4();

    chat.persist_turn(&turn(conversation_id, owner_id, Some("Gone"), "bye"))
        .await
        .unwrap();
    assert!(!chat
        .delete_conversation(conversation_id, Uuid::new_v4())
        .await
        .unwrap());
    assert!(chat
        .delete_conversation(conversation_id, owner_id)
        .await
        .unwrap());

    assert!(chat
        .load_conversation(conversation_id, owner_id)
        .await
        .unwrap()
        .is_none());
    assert!(chat.get_messages(conversation_id).await.unwrap().is_empty());

    let rows = database.usage().list_usage(owner_id, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].conversation_id, conversation_id);
}
