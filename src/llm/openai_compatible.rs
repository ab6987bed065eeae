// ABOUTME: OpenAI-compatible chat completions client with tool calling
// ABOUTME: Works with OpenAI, Groq, Ollama, vLLM, and any compatible endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # `OpenAI`-Compatible Provider
//!
//! Implements [`LlmProvider`] against `POST {base_url}/chat/completions`.
//! The whole tool catalog is sent on every request with `tool_choice: "auto"`.
//!
//! Every non-success response is mapped onto the external-service error
//! family so the orchestrator can abort the turn and decide about retries:
//!
//! | Status | Code |
//! |---|---|
//! | 401, 403 | `ExternalAuthFailed` |
//! | 429 | `ExternalRateLimited` |
//! | 5xx, connect/timeout | `ExternalServiceUnavailable` |
//! | anything else | `ExternalServiceError` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use super::{
    ChatMessage, ChatRequest, ChatResponseWithTools, LlmCapabilities, LlmProvider, MessageRole,
    TokenUsage, ToolCall, ToolDefinition,
};
use crate::errors::{AppError, AppResult, ErrorCode};

/// Default connection timeout
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default request timeout
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Characters of an error body kept in error messages
const ERROR_BODY_PREVIEW: usize = 200;

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

/// OpenAI-compatible API request structure
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

/// Tool definition for OpenAI-compatible API
#[derive(Debug, Clone, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAiFunction,
}

/// Function definition within a tool
#[derive(Debug, Clone, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: Value,
}

impl From<&ToolDefinition> for OpenAiTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            tool_type: "function".to_owned(),
            function: OpenAiFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }
}

/// Message structure for OpenAI-compatible API
#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        let tool_calls = (!msg.tool_calls.is_empty())
            .then(|| msg.tool_calls.iter().map(OpenAiToolCall::from).collect());

        // An assistant tool-call turn with no text goes out as `content: null`
        let content = if msg.role == MessageRole::Assistant
            && tool_calls.is_some()
            && msg.content.is_empty()
        {
            None
        } else {
            Some(msg.content.clone())
        };

        Self {
            role: msg.role.as_str().to_owned(),
            content,
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

/// OpenAI-compatible API response structure
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: Option<String>,
}

/// Choice in response
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

/// Message in response
#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

/// Tool call, both directions
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_call_type")]
    call_type: String,
    function: OpenAiFunctionCall,
}

fn function_call_type() -> String {
    "function".to_owned()
}

impl From<&ToolCall> for OpenAiToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            call_type: function_call_type(),
            function: OpenAiFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        }
    }
}

/// Function call details
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Usage statistics in response
#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(rename = "prompt_tokens", default)]
    prompt: u32,
    #[serde(rename = "completion_tokens", default)]
    completion: u32,
    #[serde(rename = "total_tokens", default)]
    total: Option<u32>,
}

impl From<OpenAiUsage> for TokenUsage {
    fn from(usage: OpenAiUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt,
            completion_tokens: usage.completion,
            total_tokens: usage
                .total
                .unwrap_or_else(|| usage.prompt.saturating_add(usage.completion)),
        }
    }
}

/// Error response structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the `OpenAI`-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API (e.g., <https://api.openai.com/v1>)
    pub base_url: String,
    /// API key (optional for local servers)
    pub api_key: Option<String>,
    /// Default model to use
    pub default_model: String,
    /// Provider name for logging and error messages
    pub provider_name: String,
    /// Capabilities of this provider
    pub capabilities: LlmCapabilities,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout
    pub request_timeout: Duration,
}

impl OpenAiCompatibleConfig {
    /// Configuration with default timeouts and tool-calling capabilities
    #[must_use]
    pub fn new(base_url: impl Into<String>, default_model: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let provider_name = Self::detect_provider_name(&base_url).to_owned();
        Self {
            base_url,
            api_key: None,
            default_model: default_model.into(),
            provider_name,
            capabilities: LlmCapabilities::tool_calling(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    /// Set the API key; empty keys are ignored
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    /// Override the request timeout
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn detect_provider_name(base_url: &str) -> &'static str {
        if base_url.contains("api.openai.com") {
            "openai"
        } else if base_url.contains("groq.com") {
            "groq"
        } else if base_url.contains(":11434") {
            "ollama"
        } else if base_url.contains(":8000") {
            "vllm"
        } else {
            "openai-compatible"
        }
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Generic `OpenAI`-compatible LLM provider
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        info!(
            provider = %config.provider_name,
            base_url = %config.base_url,
            model = %config.default_model,
            "Initialized chat completion provider"
        );

        Ok(Self { client, config })
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    /// Add the bearer header when a key is configured
    fn add_auth_header(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn build_request(&self, request: &ChatRequest) -> OpenAiRequest {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());
        let tools: Vec<OpenAiTool> = request.tools.iter().map(OpenAiTool::from).collect();
        let has_tools = !tools.is_empty();

        OpenAiRequest {
            model,
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            tools: has_tools.then_some(tools),
            tool_choice: has_tools.then(|| "auto".to_owned()),
        }
    }

    /// Parse error response from API
    fn parse_error_response(&self, status: StatusCode, body: &str) -> AppError {
        let service = self.config.provider_name.clone();
        let detail = serde_json::from_str::<OpenAiErrorResponse>(body).map_or_else(
            |_| body.chars().take(ERROR_BODY_PREVIEW).collect::<String>(),
            |parsed| match parsed.error.error_type {
                Some(kind) => format!("{kind} - {}", parsed.error.message),
                None => parsed.error.message,
            },
        );

        let code = match status.as_u16() {
            401 | 403 => ErrorCode::ExternalAuthFailed,
            429 => ErrorCode::ExternalRateLimited,
            500..=599 => ErrorCode::ExternalServiceUnavailable,
            _ => ErrorCode::ExternalServiceError,
        };

        AppError::new(code, format!("{service}: API error ({status}): {detail}"))
    }

    fn convert_tool_calls(calls: Vec<OpenAiToolCall>) -> Vec<ToolCall> {
        calls
            .into_iter()
            .enumerate()
            .map(|(index, call)| ToolCall {
                id: if call.id.is_empty() {
                    format!("call_{index}")
                } else {
                    call.id
                },
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect()
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.config.provider_name
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.config.capabilities
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(
        skip(self, request),
        fields(
            provider = %self.config.provider_name,
            messages = request.messages.len(),
            tools = request.tools.len(),
        )
    )]
    async fn complete_with_tools(&self, request: &ChatRequest) -> AppResult<ChatResponseWithTools> {
        let openai_request = self.build_request(request);
        debug!(model = %openai_request.model, "Sending chat completion request");

        let http_request = self
            .client
            .post(self.api_url("chat/completions"))
            .json(&openai_request);

        let response = self.add_auth_header(http_request).send().await.map_err(|e| {
            error!(error = %e, "Failed to send chat completion request");
            AppError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read chat completion response");
            AppError::from(e)
        })?;

        if !status.is_success() {
            let err = self.parse_error_response(status, &body);
            error!(status = %status, error = %err, "Chat completion request failed");
            return Err(err);
        }

        let openai_response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(ERROR_BODY_PREVIEW).collect::<String>(),
                "Failed to parse chat completion response"
            );
            AppError::external_service(
                self.config.provider_name.clone(),
                format!("Failed to parse response: {e}"),
            )
        })?;

        let choice = openai_response.choices.into_iter().next().ok_or_else(|| {
            AppError::external_service(self.config.provider_name.clone(), "API returned no choices")
        })?;

        let tool_calls = choice
            .message
            .tool_calls
            .map(Self::convert_tool_calls)
            .unwrap_or_default();
        let usage = openai_response.usage.map(TokenUsage::from).unwrap_or_default();

        info!(
            finish_reason = ?choice.finish_reason,
            tool_calls = tool_calls.len(),
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Chat completion received"
        );

        Ok(ChatResponseWithTools {
            content: choice.message.content,
            tool_calls,
            model: openai_response.model.unwrap_or(openai_request.model),
            usage,
            finish_reason: choice.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn test_assistant_tool_call_turn_serializes_null_content() {
        let message = ChatMessage::assistant_tool_calls(
            "",
            vec![ToolCall {
                id: "call_1".to_owned(),
                name: "create_task".to_owned(),
                arguments: r#"{"tasks":[]}"#.to_owned(),
            }],
        );
        let wire = serde_json::to_value(OpenAiMessage::from(&message)).unwrap();
        assert_eq!(wire["role"], "assistant");
        assert!(wire["content"].is_null());
        assert_eq!(wire["tool_calls"][0]["type"], "function");
        assert_eq!(wire["tool_calls"][0]["function"]["name"], "create_task");
    }

    #[test]
    fn test_tool_message_carries_correlation_id() {
        let message = ChatMessage::tool("call_9", r#"{"success":true}"#);
        let wire = serde_json::to_value(OpenAiMessage::from(&message)).unwrap();
        assert_eq!(wire, json!({
            "role": "tool",
            "content": "{\"success\":true}",
            "tool_call_id": "call_9",
        }));
    }

    #[test]
    fn test_status_mapping_stays_in_external_family() {
        let provider =
            OpenAiCompatibleProvider::new(OpenAiCompatibleConfig::new("http://localhost:1/v1", "m"))
                .unwrap();
        let cases = [
            (StatusCode::UNAUTHORIZED, ErrorCode::ExternalAuthFailed),
            (StatusCode::TOO_MANY_REQUESTS, ErrorCode::ExternalRateLimited),
            (StatusCode::BAD_GATEWAY, ErrorCode::ExternalServiceUnavailable),
            (StatusCode::BAD_REQUEST, ErrorCode::ExternalServiceError),
        ];
        for (status, code) in cases {
            let err = provider.parse_error_response(
                status,
                r#"{"error":{"message":"nope","type":"invalid_request_error"}}"#,
            );
            assert_eq!(err.code, code, "status {status}");
            assert!(err.message.contains("nope"));
        }
    }

    #[test]
    fn test_missing_call_ids_are_synthesized() {
        let calls = OpenAiCompatibleProvider::convert_tool_calls(vec![OpenAiToolCall {
            id: String::new(),
            call_type: function_call_type(),
            function: OpenAiFunctionCall {
                name: "get_statistics".to_owned(),
                arguments: "{}".to_owned(),
            },
        }]);
        assert_eq!(calls[0].id, "call_0");
    }
}
