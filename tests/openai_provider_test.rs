// ABOUTME: Integration tests for the OpenAI-compatible provider against a local mock server
// ABOUTME: Checks the request wire shape, tool call parsing, and HTTP status error mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::{Arc, Mutex};

use agenda_assistant::errors::ErrorCode;
use agenda_assistant::llm::{
    ChatMessage, ChatRequest, FinishOutcome, LlmProvider, OpenAiCompatibleConfig,
    OpenAiCompatibleProvider, ToolCall, ToolDefinition,
};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use common::init_test_logging;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// What the mock saw and what it answers with
#[derive(Clone)]
struct MockState {
    status: StatusCode,
    reply: Value,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn chat_completions(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    state.seen.lock().unwrap().push((auth, body));
    (state.status, Json(state.reply.clone()))
}

/// Start a mock server and return its base URL plus the captured requests
async fn start_mock(
    status: StatusCode,
    reply: Value,
) -> (String, Arc<Mutex<Vec<(Option<String>, Value)>>>) {
    init_test_logging();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        reply,
        seen: Arc::clone(&seen),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1/"), seen)
}

fn provider(base_url: &str) -> OpenAiCompatibleProvider {
    let config = OpenAiCompatibleConfig::new(base_url, "mock-model")
        .with_api_key(Some("sk-test".to_owned()));
    OpenAiCompatibleProvider::new(config).unwrap()
}

fn sample_request() -> ChatRequest {
    ChatRequest::new(vec![
        ChatMessage::system("You are a planner."),
        ChatMessage::user("Add milk to my list"),
        ChatMessage::assistant_tool_calls(
            "",
            vec![ToolCall {
                id: "call_1".to_owned(),
                name: "create_task".to_owned(),
                arguments: r#"{"tasks":[{"title":"Milk"}]}"#.to_owned(),
            }],
        ),
        ChatMessage::tool("call_1", r#"{"success":true}"#),
    ])
    .with_tools(vec![ToolDefinition {
        name: "create_task".to_owned(),
        description: "Create tasks".to_owned(),
        parameters: json!({ "type": "object", "properties": {} }),
    }])
    .with_temperature(0.2)
    .with_max_tokens(256)
}

#[tokio::test]
async fn test_request_wire_shape() {
    let reply = json!({
        "model": "mock-model-2026",
        "choices": [{
            "message": { "role": "assistant", "content": "Done." },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 42, "completion_tokens": 3, "total_tokens": 45 }
    });
    let (base_url, seen) = start_mock(StatusCode::OK, reply).await;

    let response = provider(&base_url)
        .complete_with_tools(&sample_request())
        .await
        .unwrap();
    assert_eq!(response.outcome(), FinishOutcome::Stop);
    assert_eq!(response.text(), "Done.");
    assert_eq!(response.model, "mock-model-2026");
    assert_eq!(response.usage.total_tokens, 45);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "mock-model");
    assert_eq!(body["tool_choice"], "auto");
    assert_eq!(body["max_tokens"], 256);
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["name"], "create_task");

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2]["role"], "assistant");
    assert!(messages[2]["content"].is_null());
    assert_eq!(messages[2]["tool_calls"][0]["id"], "call_1");
    assert_eq!(messages[2]["tool_calls"][0]["type"], "function");
    assert_eq!(messages[3]["role"], "tool");
    assert_eq!(messages[3]["tool_call_id"], "call_1");
}

#[tokio::test]
async fn test_tool_calls_are_parsed() {
    let reply = json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [
                    {
                        "id": "call_abc",
                        "type": "function",
                        "function": { "name": "query_entities", "arguments": "{\"kind\":\"task\"}" }
                    },
                    {
                        "function": { "name": "get_statistics", "arguments": "{}" }
                    }
                ]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
    });
    let (base_url, _seen) = start_mock(StatusCode::OK, reply).await;

    let response = provider(&base_url)
        .complete_with_tools(&sample_request())
        .await
        .unwrap();
    assert_eq!(response.outcome(), FinishOutcome::ToolCalls);
    assert_eq!(response.tool_calls.len(), 2);
    assert_eq!(response.tool_calls[0].id, "call_abc");
    assert_eq!(response.tool_calls[0].arguments, "{\"kind\":\"task\"}");
    assert_eq!(response.tool_calls[1].id, "call_1");
    assert_eq!(response.tool_calls[1].name, "get_statistics");
    // Missing total is derived
    assert_eq!(response.usage.total_tokens, 15);
    // Missing model falls back to the requested one
    assert_eq!(response.model, "mock-model");
}

#[tokio::test]
async fn test_error_statuses_map_to_codes() {
    let cases = [
        (StatusCode::UNAUTHORIZED, ErrorCode::ExternalAuthFailed),
        (StatusCode::TOO_MANY_REQUESTS, ErrorCode::ExternalRateLimited),
        (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::ExternalServiceUnavailable),
        (StatusCode::BAD_REQUEST, ErrorCode::ExternalServiceError),
    ];

    for (status, expected) in cases {
        let reply = json!({
            "error": { "message": "nope", "type": "test_error" }
        });
        let (base_url, _seen) = start_mock(status, reply).await;
        let err = provider(&base_url)
            .complete_with_tools(&sample_request())
            .await
            .unwrap_err();
        assert_eq!(err.code, expected, "status {status}");
        assert!(err.message.contains("test_error - nope"));
    }
}

#[tokio::test]
async fn test_empty_choices_is_an_error() {
    let (base_url, _seen) = start_mock(StatusCode::OK, json!({ "choices": [] })).await;
    let err = provider(&base_url)
        .complete_with_tools(&sample_request())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ExternalServiceError);
    assert!(err.message.contains("no choices"));
}
