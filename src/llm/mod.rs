// ABOUTME: Chat-completion client abstraction used by the orchestrator
// ABOUTME: Message, request, and response types plus the LlmProvider contract
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # LLM Provider Interface
//!
//! The orchestrator talks to the remote model only through [`LlmProvider`].
//! One call sends the full message list plus the tool catalog and returns
//! either a plain answer or a list of requested tool calls, always with
//! token counters.
//!
//! ## Key Concepts
//!
//! - **`LlmCapabilities`**: Bitflags describing provider features
//! - **`ChatMessage`**: Role-based message, including tool-call turns and tool results
//! - **`ChatRequest`**: Messages, tool catalog, and sampling settings
//! - **`ChatResponseWithTools`**: Text and/or tool calls, with [`FinishOutcome`]
//!
//! Providers never retry; retry policy belongs to the caller.

mod openai_compatible;
pub mod prompts;

pub use openai_compatible::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};
pub use prompts::{PromptBuilder, PromptContext};

use std::ops::AddAssign;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppResult;

// ============================================================================
// Capability Flags
// ============================================================================

bitflags::bitflags! {
    /// LLM provider capability flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LlmCapabilities: u8 {
        /// Provider supports function/tool calling
        const FUNCTION_CALLING = 0b0000_0001;
        /// Provider supports system messages
        const SYSTEM_MESSAGES = 0b0000_0010;
    }
}

impl LlmCapabilities {
    /// Capabilities the assistant needs from a provider
    #[must_use]
    pub const fn tool_calling() -> Self {
        Self::FUNCTION_CALLING.union(Self::SYSTEM_MESSAGES)
    }

    /// Check if function calling is supported
    #[must_use]
    pub const fn supports_function_calling(&self) -> bool {
        self.contains(Self::FUNCTION_CALLING)
    }

    /// Check if system messages are supported
    #[must_use]
    pub const fn supports_system_messages(&self) -> bool {
        self.contains(Self::SYSTEM_MESSAGES)
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
    /// Result of a tool call
    Tool,
}

impl MessageRole {
    /// Convert to string representation for API calls
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id echoed back in the tool message
    pub id: String,
    /// Tool name
    pub name: String,
    /// Arguments as the raw JSON string the model produced
    pub arguments: String,
}

/// A single message in a chat conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message (may be empty on tool-call turns)
    pub content: String,
    /// Tool calls carried by an assistant turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Correlation id on a tool result message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Create a new chat message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Assistant turn that requested tool calls
    #[must_use]
    pub fn assistant_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::assistant(content)
        }
    }

    /// Tool result answering the call with `tool_call_id`
    #[must_use]
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(MessageRole::Tool, content)
        }
    }
}

/// One entry of the tool catalog sent with every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// What the tool does, for the model
    pub description: String,
    /// JSON Schema of the accepted arguments
    pub parameters: Value,
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Configuration for a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Tool catalog
    pub tools: Vec<ToolDefinition>,
    /// Model identifier (provider-specific)
    pub model: Option<String>,
    /// Temperature for response randomness (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a new chat request with messages
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Attach the tool catalog
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the model to use
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(rhs.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(rhs.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(rhs.total_tokens);
    }
}

/// How a completion ended, as far as the orchestrator cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishOutcome {
    /// Plain answer
    Stop,
    /// The model wants tools executed
    ToolCalls,
}

/// Response from a chat completion that may request tool calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponseWithTools {
    /// Generated text, if any
    pub content: Option<String>,
    /// Requested tool calls, in the order the model listed them
    pub tool_calls: Vec<ToolCall>,
    /// Model used for generation
    pub model: String,
    /// Token usage statistics (zero when the service omits them)
    pub usage: TokenUsage,
    /// Finish reason reported by the service (stop, `tool_calls`, length)
    pub finish_reason: Option<String>,
}

impl ChatResponseWithTools {
    /// Any non-empty tool call list means the model asked for tools,
    /// whatever the reported finish reason.
    #[must_use]
    pub fn outcome(&self) -> FinishOutcome {
        if self.tool_calls.is_empty() {
            FinishOutcome::Stop
        } else {
            FinishOutcome::ToolCalls
        }
    }

    /// Text content or the empty string
    #[must_use]
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Chat-completion provider used by the orchestrator
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Unique provider identifier (e.g., "openai", "ollama")
    fn name(&self) -> &str;

    /// Provider capabilities
    fn capabilities(&self) -> LlmCapabilities;

    /// Default model to use if not specified in request
    fn default_model(&self) -> &str;

    /// Perform one chat completion with the tool catalog attached.
    ///
    /// # Errors
    ///
    /// Returns an external-service `AppError` when the service is unreachable,
    /// answers with a non-success status, or returns an unparseable body.
    async fn complete_with_tools(&self, request: &ChatRequest) -> AppResult<ChatResponseWithTools>;
}
