// ABOUTME: Chat conversation, message, and usage record types
// ABOUTME: DTOs produced by the conversation store and returned over HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tool::ToolUsage;
use crate::errors::AppError;

/// Role of a persisted message. Only user and assistant turns are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredRole {
    /// Message typed by the user
    User,
    /// Final answer produced by the assistant
    Assistant,
}

impl StoredRole {
    /// Column value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for StoredRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoredRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(AppError::database(format!(
                "Unknown message role stored: {other}"
            ))),
        }
    }
}

/// Conversation header row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Unique conversation ID
    pub id: Uuid,
    /// User who owns the conversation
    pub owner_id: Uuid,
    /// Conversation title (derived from the first message or renamed)
    pub title: String,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
    /// When a turn was last appended
    pub updated_at: DateTime<Utc>,
}

/// One persisted message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Unique message ID
    pub id: Uuid,
    /// Who wrote it
    pub role: StoredRole,
    /// Message text
    pub content: String,
    /// Tools invoked while producing this assistant message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_used: Option<Vec<ToolUsage>>,
    /// When the message was created
    pub created_at: DateTime<Utc>,
}

impl MessageRecord {
    /// New user message stamped now
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: StoredRole::User,
            content: content.into(),
            tools_used: None,
            created_at: Utc::now(),
        }
    }

    /// New assistant message stamped now; an empty usage list is stored as none
    #[must_use]
    pub fn assistant(content: impl Into<String>, tools_used: Vec<ToolUsage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: StoredRole::Assistant,
            content: content.into(),
            tools_used: (!tools_used.is_empty()).then_some(tools_used),
            created_at: Utc::now(),
        }
    }
}

/// A conversation together with its ordered messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation ID
    pub id: Uuid,
    /// Owner
    pub owner_id: Uuid,
    /// Title
    pub title: String,
    /// Messages in append order
    pub messages: Vec<MessageRecord>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Summary of a conversation for listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation ID
    pub id: Uuid,
    /// Conversation title
    pub title: String,
    /// Number of messages in the conversation
    pub message_count: i64,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
    /// When the conversation was last updated
    pub updated_at: DateTime<Utc>,
}

/// One row of the append-only usage ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Row ID
    pub id: Uuid,
    /// User charged for the turn
    pub owner_id: Uuid,
    /// Conversation the turn belongs to
    pub conversation_id: Uuid,
    /// Model identifier reported by the service
    pub model: String,
    /// Prompt tokens summed across the turn's model calls
    pub input_tokens: i64,
    /// Completion tokens summed across the turn's model calls
    pub output_tokens: i64,
    /// When the turn completed
    pub created_at: DateTime<Utc>,
}

/// Aggregate token usage for one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Completed turns
    pub turns: i64,
    /// Total prompt tokens
    pub input_tokens: i64,
    /// Total completion tokens
    pub output_tokens: i64,
    /// Sum of both
    pub total_tokens: i64,
}
