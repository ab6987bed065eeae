// ABOUTME: Integration tests for the assistant HTTP routes
// ABOUTME: Drives the full router with a scripted model provider and real bearer tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use agenda_assistant::errors::AppError;
use agenda_assistant::models::{Conversation, UsageSummary};
use agenda_assistant::resources::ServerResources;
use agenda_assistant::routes::assistant::{
    ConversationListResponse, SendMessageResponse, TURN_FAILED_MESSAGE,
};
use agenda_assistant::routes::router;
use axum::http::StatusCode;
use chrono_tz::Europe::Rome;
use common::{
    create_test_server_resources, test_identity, text_response, tool_call, tool_call_response,
    ScriptedProvider,
};
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};
use uuid::Uuid;

fn token_for(resources: &ServerResources) -> String {
    let identity = test_identity(Rome);
    resources.auth_manager.generate_token(&identity).unwrap()
}

async fn send(resources: &Arc<ServerResources>, token: &str, body: &Value) -> SendMessageResponse {
    let response = AxumTestRequest::post("/api/assistant/messages")
        .bearer(token)
        .json(body)
        .send(router(Arc::clone(resources)))
        .await;
    assert_eq!(response.status(), StatusCode::OK, "{}", response.text());
    response.json()
}

#[tokio::test]
async fn test_health_endpoints() {
    let resources = create_test_server_resources(ScriptedProvider::new(Vec::new())).await;

    let health = AxumTestRequest::get("/health")
        .send(router(Arc::clone(&resources)))
        .await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(health.json::<Value>()["status"], "healthy");

    let ready = AxumTestRequest::get("/ready").send(router(resources)).await;
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let provider = ScriptedProvider::new(Vec::new());
    let resources = create_test_server_resources(provider.clone()).await;

    let response = AxumTestRequest::post("/api/assistant/messages")
        .json(&json!({ "message": "ciao" }))
        .send(router(Arc::clone(&resources)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"]["code"], "AUTH_REQUIRED");

    let response = AxumTestRequest::get("/api/assistant/conversations")
        .bearer("not-a-jwt")
        .send(router(resources))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_send_message_runs_a_turn() {
    let args = json!({ "title": "Idee regalo", "content": "Libro per Anna" });
    let provider = ScriptedProvider::new(vec![
        Ok(tool_call_response(vec![tool_call("call_1", "create_note", &args)], 90, 20)),
        Ok(text_response("Nota salvata.", 120, 6)),
    ]);
    let resources = create_test_server_resources(provider.clone()).await;
    let token = token_for(&resources);

    let body = send(
        &resources,
        &token,
        &json!({ "content": "salva una nota: libro per Anna" }),
    )
    .await;
    assert!(body.success);
    assert_eq!(body.response, "Nota salvata.");
    assert_eq!(body.total_tokens, 236);
    assert_eq!(body.tools_used, vec!["create_note".to_owned()]);

    let response = AxumTestRequest::get(&format!(
        "/api/assistant/conversations/{}",
        body.conversation_id
    ))
    .bearer(&token)
    .send(router(resources))
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let conversation: Conversation = response.json();
    assert_eq!(conversation.messages.len(), 2);
    assert_eq!(conversation.title, "salva una nota: libro per Anna");
}

#[tokio::test]
async fn test_conversation_management() {
    let provider = ScriptedProvider::new(vec![
        Ok(text_response("a", 5, 1)),
        Ok(text_response("b", 7, 2)),
    ]);
    let resources = create_test_server_resources(provider).await;
    let token = token_for(&resources);

    let first = send(&resources, &token, &json!({ "message": "prima" })).await;
    let second = send(
        &resources,
        &token,
        &json!({ "message": "ancora", "conversation_id": first.conversation_id }),
    )
    .await;
    assert_eq!(second.conversation_id, first.conversation_id);

    let list = AxumTestRequest::get("/api/assistant/conversations?limit=5")
        .bearer(&token)
        .send(router(Arc::clone(&resources)))
        .await;
    assert_eq!(list.status(), StatusCode::OK);
    let list: ConversationListResponse = list.json();
    assert_eq!(list.total, 1);
    assert_eq!(list.conversations[0].message_count, 4);

    let path = format!("/api/assistant/conversations/{}", first.conversation_id);
    let renamed = AxumTestRequest::put(&path)
        .bearer(&token)
        .json(&json!({ "title": "Rinominata" }))
        .send(router(Arc::clone(&resources)))
        .await;
    assert_eq!(renamed.status(), StatusCode::OK);

    let usage = AxumTestRequest::get("/api/assistant/usage")
        .bearer(&token)
        .send(router(Arc::clone(&resources)))
        .await;
    let usage: UsageSummary = usage.json();
    assert_eq!(usage.turns, 2);
    assert_eq!(usage.total_tokens, 15);

    let deleted = AxumTestRequest::delete(&path)
        .bearer(&token)
        .send(router(Arc::clone(&resources)))
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = AxumTestRequest::get(&path)
        .bearer(&token)
        .send(router(resources))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_other_users_cannot_see_conversation() {
    let provider = ScriptedProvider::new(vec![Ok(text_response("privato", 1, 1))]);
    let resources = create_test_server_resources(provider).await;
    let owner = token_for(&resources);
    let stranger = token_for(&resources);

    let body = send(&resources, &owner, &json!({ "message": "segreto" })).await;

    let response = AxumTestRequest::get(&format!(
        "/api/assistant/conversations/{}",
        body.conversation_id
    ))
    .bearer(&stranger)
    .send(router(resources))
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_client_errors_pass_through() {
    let resources = create_test_server_resources(ScriptedProvider::new(Vec::new())).await;
    let token = token_for(&resources);

    let empty = AxumTestRequest::post("/api/assistant/messages")
        .bearer(&token)
        .json(&json!({ "message": "   " }))
        .send(router(Arc::clone(&resources)))
        .await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    assert_eq!(empty.json::<Value>()["error"]["code"], "INVALID_INPUT");

    let unknown = AxumTestRequest::post("/api/assistant/messages")
        .bearer(&token)
        .json(&json!({ "message": "ciao", "conversation_id": Uuid::new_v4() }))
        .send(router(Arc::clone(&resources)))
        .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let bad_id = AxumTestRequest::get("/api/assistant/conversations/not-a-uuid")
        .bearer(&token)
        .send(router(resources))
        .await;
    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_model_outage_returns_generic_message() {
    let provider = ScriptedProvider::new(vec![Err(AppError::external_unavailable(
        "openai",
        "upstream connect error: secret internal detail",
    ))]);
    let resources = create_test_server_resources(provider).await;
    let token = token_for(&resources);

    let response = AxumTestRequest::post("/api/assistant/messages")
        .bearer(&token)
        .json(&json!({ "message": "ciao" }))
        .send(router(Arc::clone(&resources)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], TURN_FAILED_MESSAGE);
    assert!(!response.text().contains("secret internal detail"));

    let list = AxumTestRequest::get("/api/assistant/conversations")
        .bearer(&token)
        .send(router(resources))
        .await;
    let list: ConversationListResponse = list.json();
    assert_eq!(list.total, 0);
}
