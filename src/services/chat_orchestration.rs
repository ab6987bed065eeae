// ABOUTME: Chat orchestration service running one assistant turn end to end
// ABOUTME: Prompt assembly, model calls with retry, a single tool round, and atomic persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # Chat Orchestration
//!
//! A turn moves through these steps:
//!
//! 1. Load the conversation (ownership checked) or allocate a new id.
//! 2. Build the system instruction from the caller's identity, a live
//!    workspace snapshot, and the clock in the caller's timezone.
//! 3. Call the model with the system message, the recent history, the new
//!    user message, and the tool catalog.
//! 4. If the model asked for tools, run them one after the other in the
//!    order given, append one `tool` message per call, and call the model a
//!    second time. Tool calls in the second reply are not executed.
//! 5. Persist the user message, the assistant message with its tool usage,
//!    and one usage row in a single transaction.
//!
//! Nothing is written when the turn fails before step 5. Tool side effects
//! already applied in step 4 are not rolled back.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn, Span};
use uuid::Uuid;

use crate::auth::UserIdentity;
use crate::config::AssistantConfig;
use crate::constants::limits::{
    CONVERSATION_LIST_DEFAULT, CONVERSATION_LIST_MAX, MAX_USER_MESSAGE_CHARS, TITLE_MAX_CHARS,
};
use crate::database::{ChatManager, Database, TurnRecord, UsageManager};
use crate::errors::{AppError, AppResult};
use crate::llm::{
    ChatMessage, ChatRequest, ChatResponseWithTools, FinishOutcome, LlmProvider, PromptBuilder,
    PromptContext, TokenUsage,
};
use crate::models::{
    Conversation, ConversationSummary, MessageRecord, StoredRole, ToolUsage, UsageRecord,
    UsageSummary,
};
use crate::services::statistics::StatisticsService;
use crate::tools::{ToolExecutionContext, ToolRegistry};
use crate::workspace::WorkspaceStore;

/// What a completed turn returns to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Conversation the turn was appended to
    pub conversation_id: Uuid,
    /// Assistant reply text
    pub response: String,
    /// Tokens consumed by both model calls
    pub total_tokens: u32,
    /// Names of the tools executed, in order
    pub tools_used: Vec<String>,
}

/// Title for a new conversation: the first message, cut to
/// [`TITLE_MAX_CHARS`] characters with `...` appended when cut
#[must_use]
pub fn conversation_title(first_message: &str) -> String {
    let text = first_message.trim();
    if text.chars().count() <= TITLE_MAX_CHARS {
        return text.to_owned();
    }
    let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
    title.push_str("...");
    title
}

/// Persisted messages to replay, starting on a user message
fn history_window(history: &[MessageRecord]) -> impl Iterator<Item = ChatMessage> + '_ {
    history
        .iter()
        .skip_while(|m| m.role != StoredRole::User)
        .map(|m| match m.role {
            StoredRole::User => ChatMessage::user(m.content.as_str()),
            StoredRole::Assistant => ChatMessage::assistant(m.content.as_str()),
        })
}

/// Drives assistant turns and the conversation lifecycle
pub struct ChatOrchestrator {
    provider: Arc<dyn LlmProvider>,
    registry: Arc<ToolRegistry>,
    store: Arc<dyn WorkspaceStore>,
    chat: ChatManager,
    usage: UsageManager,
    prompts: PromptBuilder,
    config: AssistantConfig,
}

impl ChatOrchestrator {
    /// Orchestrator backed by `database` with the built-in tool catalog
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider cannot take a system
    /// message or call tools.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        database: &Database,
        config: AssistantConfig,
    ) -> AppResult<Self> {
        let capabilities = provider.capabilities();
        if !capabilities.supports_function_calling() || !capabilities.supports_system_messages() {
            return Err(AppError::config(format!(
                "Provider '{}' must support tool calling and system messages",
                provider.name()
            )));
        }

        Ok(Self {
            provider,
            registry: Arc::new(ToolRegistry::with_builtin_tools()),
            store: Arc::new(database.workspace()),
            chat: database.chat(),
            usage: database.usage(),
            prompts: PromptBuilder::default(),
            config,
        })
    }

    /// Replace the tool registry
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the static system prompt
    #[must_use]
    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    /// Model configuration in use
    #[must_use]
    pub const fn config(&self) -> &AssistantConfig {
        &self.config
    }

    // ========================================================================
    // Turn Processing
    // ========================================================================

    /// Process one user message and return the assistant's reply.
    ///
    /// Without `conversation_id` a new conversation is started; it only
    /// exists once the turn has been persisted.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty or oversized message
    /// - `ResourceNotFound` when the conversation does not exist for this user
    /// - external-service errors when the model call fails (after retries)
    /// - database errors when loading or persisting fails
    #[instrument(skip_all, fields(user_id = %identity.user_id, conversation_id))]
    pub async fn send_message(
        &self,
        identity: &UserIdentity,
        text: &str,
        conversation_id: Option<Uuid>,
    ) -> AppResult<TurnOutcome> {
        let started = Instant::now();
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::invalid_input("Message must not be empty"));
        }
        if text.chars().count() > MAX_USER_MESSAGE_CHARS {
            return Err(AppError::invalid_input(format!(
                "Message is longer than {MAX_USER_MESSAGE_CHARS} characters"
            )));
        }

        let owner_id = identity.user_id;
        let (conversation_id, new_title, history) = match conversation_id {
            Some(id) => {
                self.chat
                    .get_conversation(id, owner_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Conversation"))?;
                let history = self
                    .chat
                    .get_recent_messages(id, self.config.history_limit)
                    .await?;
                (id, None, history)
            }
            None => (Uuid::new_v4(), Some(conversation_title(text)), Vec::new()),
        };
        Span::current().record("conversation_id", conversation_id.to_string());

        let timezone = self.config.resolve_timezone(identity.timezone.as_deref());
        let now = Utc::now();
        let snapshot = StatisticsService::new(self.store.as_ref(), owner_id, timezone, now)
            .snapshot()
            .await?;
        let system_prompt = self.prompts.build(&PromptContext {
            user: identity,
            snapshot: &snapshot,
            now: now.with_timezone(&timezone),
        });

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(history_window(&history));
        messages.push(ChatMessage::user(text));
        let user_message = MessageRecord::user(text);

        let mut request = self.request(messages);
        debug!(
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Calling model"
        );
        let first = self.complete(&request).await?;
        let mut usage = first.usage;
        let mut model = first.model.clone();
        let mut tools_used = Vec::new();

        let reply = match first.outcome() {
            FinishOutcome::Stop => first.text().to_owned(),
            FinishOutcome::ToolCalls => {
                let context = ToolExecutionContext::new(owner_id, timezone, Arc::clone(&self.store))
                    .with_now(now);
                request.messages.push(ChatMessage::assistant_tool_calls(
                    first.text(),
                    first.tool_calls.clone(),
                ));
                for call in &first.tool_calls {
                    let result = self
                        .registry
                        .dispatch(&call.name, &call.arguments, &context)
                        .await;
                    request
                        .messages
                        .push(ChatMessage::tool(call.id.as_str(), result.to_content()));
                    tools_used.push(ToolUsage {
                        name: call.name.clone(),
                        result,
                    });
                }

                let second = self.complete(&request).await?;
                if second.outcome() == FinishOutcome::ToolCalls {
                    warn!(
                        ignored_calls = second.tool_calls.len(),
                        "Model requested a second tool round; using its text"
                    );
                }
                usage += second.usage;
                model.clone_from(&second.model);
                second.text().to_owned()
            }
        };

        let tool_names: Vec<String> = tools_used.iter().map(|t| t.name.clone()).collect();
        let turn = TurnRecord {
            conversation_id,
            owner_id,
            new_title,
            user_message,
            assistant_message: MessageRecord::assistant(reply.as_str(), tools_used),
            usage: self.usage_record(owner_id, conversation_id, model, usage),
        };
        self.chat.persist_turn(&turn).await?;

        info!(
            provider = self.provider.name(),
            tools = tool_names.len(),
            total_tokens = usage.total_tokens,
            elapsed_ms = started.elapsed().as_millis(),
            "Completed assistant turn"
        );

        Ok(TurnOutcome {
            conversation_id,
            response: reply,
            total_tokens: usage.total_tokens,
            tools_used: tool_names,
        })
    }

    fn request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        let mut request = ChatRequest::new(messages)
            .with_tools(self.registry.definitions())
            .with_model(self.config.model.as_str());
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }

    /// One model call, retried with backoff on retryable failures
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponseWithTools> {
        let policy = self.config.retry;
        let mut attempt = 0;
        loop {
            match self.provider.complete_with_tools(request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.code.is_retryable() && attempt < policy.max_retries => {
                    attempt += 1;
                    let delay = policy.delay_for(attempt);
                    warn!(
                        attempt,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Model call failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Ledger row; a blank reported model is booked under the provider default
    fn usage_record(
        &self,
        owner_id: Uuid,
        conversation_id: Uuid,
        model: String,
        usage: TokenUsage,
    ) -> UsageRecord {
        let model = if model.trim().is_empty() {
            self.provider.default_model().to_owned()
        } else {
            model
        };
        UsageRecord {
            id: Uuid::new_v4(),
            owner_id,
            conversation_id,
            model,
            input_tokens: i64::from(usage.prompt_tokens),
            output_tokens: i64::from(usage.completion_tokens),
            created_at: Utc::now(),
        }
    }

    // ========================================================================
    // Conversation Lifecycle
    // ========================================================================

    /// Full conversation with every message
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when it does not exist for this user.
    pub async fn get_conversation(
        &self,
        identity: &UserIdentity,
        conversation_id: Uuid,
    ) -> AppResult<Conversation> {
        self.chat
            .load_conversation(conversation_id, identity.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation"))
    }

    /// Most recently updated conversations first
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn list_recent_conversations(
        &self,
        identity: &UserIdentity,
        limit: Option<u32>,
    ) -> AppResult<Vec<ConversationSummary>> {
        let limit = limit
            .unwrap_or(CONVERSATION_LIST_DEFAULT)
            .clamp(1, CONVERSATION_LIST_MAX);
        self.chat
            .list_conversations(identity.user_id, limit, 0)
            .await
    }

    /// Delete a conversation and its messages
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when it does not exist for this user.
    pub async fn delete_conversation(
        &self,
        identity: &UserIdentity,
        conversation_id: Uuid,
    ) -> AppResult<()> {
        if !self
            .chat
            .delete_conversation(conversation_id, identity.user_id)
            .await?
        {
            return Err(AppError::not_found("Conversation"));
        }
        info!(user_id = %identity.user_id, %conversation_id, "Deleted conversation");
        Ok(())
    }

    /// Set a new title
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank title and `ResourceNotFound` when
    /// the conversation does not exist for this user.
    pub async fn rename_conversation(
        &self,
        identity: &UserIdentity,
        conversation_id: Uuid,
        title: &str,
    ) -> AppResult<()> {
        if title.trim().is_empty() {
            return Err(AppError::invalid_input("Title must not be empty"));
        }
        let title = conversation_title(title);
        if !self
            .chat
            .update_conversation_title(conversation_id, identity.user_id, &title)
            .await?
        {
            return Err(AppError::not_found("Conversation"));
        }
        Ok(())
    }

    /// Token totals across every turn the user has made
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn usage_summary(&self, identity: &UserIdentity) -> AppResult<UsageSummary> {
        self.usage.summary(identity.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_truncation() {
        assert_eq!(conversation_title("  Plan the week  "), "Plan the week");

        let long = "a".repeat(60);
        let title = conversation_title(&long);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 3);
        assert!(title.ends_with("..."));

        let exact = "è".repeat(TITLE_MAX_CHARS);
        assert_eq!(conversation_title(&exact), exact);
    }

    #[test]
    fn test_history_window_starts_on_user() {
        let history = vec![
            MessageRecord::assistant("orphan reply", Vec::new()),
            MessageRecord::user("hi"),
            MessageRecord::assistant("hello", Vec::new()),
        ];
        let window: Vec<ChatMessage> = history_window(&history).collect();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0], ChatMessage::user("hi"));
        assert_eq!(window[1], ChatMessage::assistant("hello"));
    }
}
