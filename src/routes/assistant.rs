// ABOUTME: Assistant route handlers: send a message, manage conversations, read usage
// ABOUTME: Thin handlers that authenticate, decode, and delegate to the orchestrator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! Assistant routes
//!
//! Every handler requires a bearer token. Aborted turns answer with a
//! generic message; the detailed error only goes to the log.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::auth::UserIdentity;
use crate::errors::AppError;
use crate::models::ConversationSummary;
use crate::resources::ServerResources;
use crate::utils::uuid::parse_uuid;

/// Message returned when a turn aborts for a server-side reason
pub const TURN_FAILED_MESSAGE: &str =
    "The assistant could not complete this request. Please try again.";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of `POST /api/assistant/messages`
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// User text
    #[serde(alias = "content")]
    pub message: String,
    /// Existing conversation; omitted to start a new one
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
}

/// Successful turn
#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    /// Always true
    pub success: bool,
    /// Conversation the turn belongs to
    pub conversation_id: Uuid,
    /// Assistant reply
    pub response: String,
    /// Tokens used by the turn
    pub total_tokens: u32,
    /// Tools executed during the turn
    pub tools_used: Vec<String>,
}

/// Query parameters for listing conversations
#[derive(Debug, Deserialize)]
pub struct ListConversationsQuery {
    /// Maximum number of conversations
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Conversation listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationListResponse {
    /// Most recently updated first
    pub conversations: Vec<ConversationSummary>,
    /// Number returned
    pub total: usize,
}

/// Body of `PUT /api/assistant/conversations/:id`
#[derive(Debug, Deserialize)]
pub struct RenameConversationRequest {
    /// New title
    pub title: String,
}

// ============================================================================
// Assistant Routes
// ============================================================================

/// Assistant routes handler
pub struct AssistantRoutes;

impl AssistantRoutes {
    /// Create all assistant routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/assistant/messages", post(Self::send_message))
            .route(
                "/api/assistant/conversations",
                get(Self::list_conversations),
            )
            .route(
                "/api/assistant/conversations/:conversation_id",
                get(Self::get_conversation)
                    .put(Self::rename_conversation)
                    .delete(Self::delete_conversation),
            )
            .route("/api/assistant/usage", get(Self::usage))
            .with_state(resources)
    }

    fn authenticate(
        headers: &HeaderMap,
        resources: &ServerResources,
    ) -> Result<UserIdentity, AppError> {
        let authorization = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok());
        resources.authenticate(authorization)
    }

    /// Client errors pass through; anything else becomes the generic failure
    fn turn_failure(err: AppError) -> Response {
        let status = StatusCode::from_u16(err.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_client_error() {
            return err.into_response();
        }
        error!(code = ?err.code, error = %err, "Assistant turn aborted");
        (
            status,
            Json(json!({ "success": false, "error": TURN_FAILED_MESSAGE })),
        )
            .into_response()
    }

    // ========================================================================
    // Handlers
    // ========================================================================

    async fn send_message(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<SendMessageRequest>,
    ) -> Result<Response, AppError> {
        let identity = Self::authenticate(&headers, &resources)?;

        let outcome = match resources
            .orchestrator
            .send_message(&identity, &request.message, request.conversation_id)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return Ok(Self::turn_failure(e)),
        };

        let response = SendMessageResponse {
            success: true,
            conversation_id: outcome.conversation_id,
            response: outcome.response,
            total_tokens: outcome.total_tokens,
            tools_used: outcome.tools_used,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    async fn list_conversations(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListConversationsQuery>,
    ) -> Result<Response, AppError> {
        let identity = Self::authenticate(&headers, &resources)?;

        let conversations = resources
            .orchestrator
            .list_recent_conversations(&identity, query.limit)
            .await?;
        let response = ConversationListResponse {
            total: conversations.len(),
            conversations,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    async fn get_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(conversation_id): Path<String>,
    ) -> Result<Response, AppError> {
        let identity = Self::authenticate(&headers, &resources)?;
        let conversation_id = parse_uuid(&conversation_id)?;

        let conversation = resources
            .orchestrator
            .get_conversation(&identity, conversation_id)
            .await?;
        Ok((StatusCode::OK, Json(conversation)).into_response())
    }

    async fn rename_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(conversation_id): Path<String>,
        Json(request): Json<RenameConversationRequest>,
    ) -> Result<Response, AppError> {
        let identity = Self::authenticate(&headers, &resources)?;
        let conversation_id = parse_uuid(&conversation_id)?;

        resources
            .orchestrator
            .rename_conversation(&identity, conversation_id, &request.title)
            .await?;
        Ok((StatusCode::OK, Json(json!({ "success": true }))).into_response())
    }

    async fn delete_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(conversation_id): Path<String>,
    ) -> Result<Response, AppError> {
        let identity = Self::authenticate(&headers, &resources)?;
        let conversation_id = parse_uuid(&conversation_id)?;

        resources
            .orchestrator
            .delete_conversation(&identity, conversation_id)
            .await?;
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    async fn usage(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let identity = Self::authenticate(&headers, &resources)?;

        let summary = resources.orchestrator.usage_summary(&identity).await?;
        Ok((StatusCode::OK, Json(summary)).into_response())
    }
}
