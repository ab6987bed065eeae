// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Scripted model provider, identities, configuration, and orchestrator builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
//! Shared test utilities for `agenda_assistant`

use std::collections::VecDeque;
use std::env;
use std::sync::{Arc, Mutex, Once};

use agenda_assistant::auth::UserIdentity;
use agenda_assistant::config::{AssistantConfig, AuthConfig, ServerConfig};
use agenda_assistant::database::Database;
use agenda_assistant::errors::AppResult;
use agenda_assistant::llm::{
    ChatRequest, ChatResponseWithTools, LlmCapabilities, LlmProvider, TokenUsage, ToolCall,
};
use agenda_assistant::resources::ServerResources;
use agenda_assistant::services::ChatOrchestrator;
use async_trait::async_trait;
use chrono_tz::Tz;
use serde_json::Value;
use tracing::Level;
use uuid::Uuid;

/// Model id used by every test configuration
pub const TEST_MODEL: &str = "test-model";

/// Secret long enough for the configuration check
pub const TEST_JWT_SECRET: &str = "test-secret-with-at-least-thirty-two-bytes";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

// ============================================================================
// Scripted Provider
// ============================================================================

/// Provider that replays queued responses and records every request
pub struct ScriptedProvider {
    capabilities: LlmCapabilities,
    responses: Mutex<VecDeque<AppResult<ChatResponseWithTools>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<AppResult<ChatResponseWithTools>>) -> Arc<Self> {
        Self::with_capabilities(LlmCapabilities::tool_calling(), responses)
    }

    pub fn with_capabilities(
        capabilities: LlmCapabilities,
        responses: Vec<AppResult<ChatResponseWithTools>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            capabilities,
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.capabilities
    }

    fn default_model(&self) -> &str {
        TEST_MODEL
    }

    async fn complete_with_tools(&self, request: &ChatRequest) -> AppResult<ChatResponseWithTools> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted provider ran out of responses")
    }
}

/// Plain text reply
pub fn text_response(text: &str, prompt_tokens: u32, completion_tokens: u32) -> ChatResponseWithTools {
    ChatResponseWithTools {
        content: Some(text.to_owned()),
        tool_calls: Vec::new(),
        model: TEST_MODEL.to_owned(),
        usage: TokenUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        },
        finish_reason: Some("stop".to_owned()),
    }
}

/// Reply requesting the given tool calls
pub fn tool_call_response(
    calls: Vec<ToolCall>,
    prompt_tokens: u32,
    completion_tokens: u32,
) -> ChatResponseWithTools {
    ChatResponseWithTools {
        content: None,
        tool_calls: calls,
        model: TEST_MODEL.to_owned(),
        usage: TokenUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        },
        finish_reason: Some("tool_calls".to_owned()),
    }
}

pub fn tool_call(id: &str, name: &str, arguments: &Value) -> ToolCall {
    ToolCall {
        id: id.to_owned(),
        name: name.to_owned(),
        arguments: arguments.to_string(),
    }
}

// ============================================================================
// Identities and Configuration
// ============================================================================

pub fn test_identity(timezone: Tz) -> UserIdentity {
    UserIdentity {
        user_id: Uuid::new_v4(),
        display_name: Some("Giulia".to_owned()),
        timezone: Some(timezone.name().to_owned()),
        locale: Some("it-IT".to_owned()),
    }
}

pub fn test_assistant_config() -> AssistantConfig {
    AssistantConfig::new(TEST_MODEL)
}

pub fn test_server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_owned(),
        http_port: 0,
        database_url: "sqlite::memory:".to_owned(),
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_owned(),
            jwt_audience: "agenda-assistant".to_owned(),
            jwt_expiry_hours: 1,
        },
        assistant: test_assistant_config(),
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Orchestrator over a fresh in-memory database
pub async fn create_test_orchestrator(
    provider: Arc<ScriptedProvider>,
    config: AssistantConfig,
) -> (ChatOrchestrator, Database) {
    init_test_logging();
    let database = Database::in_memory().await.unwrap();
    let orchestrator = ChatOrchestrator::new(provider, &database, config).unwrap();
    (orchestrator, database)
}

/// Server resources over a fresh in-memory database
pub async fn create_test_server_resources(provider: Arc<ScriptedProvider>) -> Arc<ServerResources> {
    init_test_logging();
    let database = Database::in_memory().await.unwrap();
    Arc::new(ServerResources::new(database, provider, test_server_config()).unwrap())
}
