// ABOUTME: Conversation store for assistant chats and their ordered messages
// ABOUTME: Owner-scoped CRUD plus the atomic write of one completed turn
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::usage::insert_usage;
use super::{time_col, to_db_time, uuid_col, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{
    Conversation, ConversationRecord, ConversationSummary, MessageRecord, StoredRole, ToolUsage,
    UsageRecord,
};

// ============================================================================
// Schema
// ============================================================================

impl Database {
    pub(super) async fn migrate_chat(&self) -> AppResult<()> {
        self.run_schema(&[
            r"
            CREATE TABLE IF NOT EXISTS chat_conversations (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            r"
            CREATE INDEX IF NOT EXISTS idx_chat_conversations_owner
            ON chat_conversations(owner_id, updated_at DESC)
            ",
            r"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL REFERENCES chat_conversations(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                content TEXT NOT NULL,
                tools_used TEXT,
                created_at TEXT NOT NULL,
                UNIQUE (conversation_id, position)
            )
            ",
        ])
        .await
    }
}

// ============================================================================
// Turn Record
// ============================================================================

/// Everything one completed turn writes, in a single transaction
#[derive(Debug, Clone)]
pub struct TurnRecord {
    /// Conversation the turn belongs to
    pub conversation_id: Uuid,
    /// Caller
    pub owner_id: Uuid,
    /// Present only when the conversation does not exist yet
    pub new_title: Option<String>,
    /// The user's message
    pub user_message: MessageRecord,
    /// The assistant's final answer
    pub assistant_message: MessageRecord,
    /// Tokens spent on the turn
    pub usage: UsageRecord,
}

// ============================================================================
// Chat Manager
// ============================================================================

/// Chat database operations manager
#[derive(Clone)]
pub struct ChatManager {
    pool: SqlitePool,
}

impl ChatManager {
    /// Create a new chat manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Conversation Operations
    // ========================================================================

    /// Get a conversation header, only if `owner_id` owns it
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_conversation(
        &self,
        conversation_id: Uuid,
        owner_id: Uuid,
    ) -> AppResult<Option<ConversationRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, owner_id, title, created_at, updated_at
            FROM chat_conversations
            WHERE id = $1 AND owner_id = $2
            ",
        )
        .bind(conversation_id.to_string())
        .bind(owner_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    /// Get a conversation with all of its messages in append order
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn load_conversation(
        &self,
        conversation_id: Uuid,
        owner_id: Uuid,
    ) -> AppResult<Option<Conversation>> {
        let Some(record) = self.get_conversation(conversation_id, owner_id).await? else {
            return Ok(None);
        };
        let messages = self.get_messages(conversation_id).await?;

        Ok(Some(Conversation {
            id: record.id,
            owner_id: record.owner_id,
            title: record.title,
            messages,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }))
    }

    /// List conversations for a user, most recently updated first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_conversations(
        &self,
        owner_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> AppResult<Vec<ConversationSummary>> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.title, c.created_at, c.updated_at,
                   COUNT(m.id) AS message_count
            FROM chat_conversations c
            LEFT JOIN chat_messages m ON m.conversation_id = c.id
            WHERE c.owner_id = $1
            GROUP BY c.id
            ORDER BY c.updated_at DESC, c.id
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(owner_id.to_string())
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        rows.iter()
            .map(|r| {
                Ok(ConversationSummary {
                    id: uuid_col(r, "id")?,
                    title: r.try_get("title")?,
                    message_count: r.try_get("message_count")?,
                    created_at: time_col(r, "created_at")?,
                    updated_at: time_col(r, "updated_at")?,
                })
            })
            .collect()
    }

    /// Update conversation title
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn update_conversation_title(
        &self,
        conversation_id: Uuid,
        owner_id: Uuid,
        title: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE chat_conversations
            SET title = $1, updated_at = $2
            WHERE id = $3 AND owner_id = $4
            ",
        )
        .bind(title)
        .bind(to_db_time(Utc::now()))
        .bind(conversation_id.to_string())
        .bind(owner_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update conversation title: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a conversation and all its messages (cascade).
    /// Usage ledger rows are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete_conversation(&self, conversation_id: Uuid, owner_id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM chat_conversations WHERE id = $1 AND owner_id = $2")
            .bind(conversation_id.to_string())
            .bind(owner_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete conversation: {e}")))?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM chat_messages WHERE conversation_id = $1")
            .bind(conversation_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete messages: {e}")))?;

        tx.commit().await?;
        Ok(true)
    }

    // ========================================================================
    // Message Operations
    // ========================================================================

    /// Get all messages for a conversation in append order
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_messages(&self, conversation_id: Uuid) -> AppResult<Vec<MessageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, role, content, tools_used, created_at
            FROM chat_messages
            WHERE conversation_id = $1
            ORDER BY position ASC
            ",
        )
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get messages: {e}")))?;

        rows.iter().map(message_from_row).collect()
    }

    /// Get the last `limit` messages, still in append order
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_recent_messages(
        &self,
        conversation_id: Uuid,
        limit: usize,
    ) -> AppResult<Vec<MessageRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r"
            SELECT id, role, content, tools_used, created_at FROM (
                SELECT id, role, content, tools_used, created_at, position
                FROM chat_messages
                WHERE conversation_id = $1
                ORDER BY position DESC
                LIMIT $2
            )
            ORDER BY position ASC
            ",
        )
        .bind(conversation_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get recent messages: {e}")))?;

        rows.iter().map(message_from_row).collect()
    }

    /// Persist one completed turn atomically: the conversation header (created
    /// when new, touched otherwise), the user and assistant messages, and the
    /// usage record. Nothing is written if any statement fails.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if an existing conversation vanished or is
    /// owned by someone else, and a database error if a statement fails.
    pub async fn persist_turn(&self, turn: &TurnRecord) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let now = to_db_time(turn.assistant_message.created_at);

        if let Some(title) = &turn.new_title {
            sqlx::query(
                r"
                INSERT INTO chat_conversations (id, owner_id, title, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(turn.conversation_id.to_string())
            .bind(turn.owner_id.to_string())
            .bind(title)
            .bind(to_db_time(turn.user_message.created_at))
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to create conversation: {e}")))?;
        } else {
            let touched = sqlx::query(
                "UPDATE chat_conversations SET updated_at = $1 WHERE id = $2 AND owner_id = $3",
            )
            .bind(&now)
            .bind(turn.conversation_id.to_string())
            .bind(turn.owner_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to update conversation: {e}")))?;

            if touched.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(AppError::not_found("Conversation")
                    .with_resource_id(turn.conversation_id.to_string()));
            }
        }

        let mut position = next_position(&mut tx, turn.conversation_id).await?;
        for message in [&turn.user_message, &turn.assistant_message] {
            insert_message(&mut tx, turn.conversation_id, position, message).await?;
            position += 1;
        }

        insert_usage(&mut tx, &turn.usage).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Replace the full message sequence of a conversation (last write wins)
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the conversation is not owned by
    /// `owner_id`, and a database error if a statement fails.
    pub async fn replace_messages(
        &self,
        conversation_id: Uuid,
        owner_id: Uuid,
        messages: &[MessageRecord],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query(
            "UPDATE chat_conversations SET updated_at = $1 WHERE id = $2 AND owner_id = $3",
        )
        .bind(to_db_time(Utc::now()))
        .bind(conversation_id.to_string())
        .bind(owner_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to update conversation: {e}")))?;

        if touched.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::not_found("Conversation"));
        }

        sqlx::query("DELETE FROM chat_messages WHERE conversation_id = $1")
            .bind(conversation_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to clear messages: {e}")))?;

        for (position, message) in (0_i64..).zip(messages) {
            insert_message(&mut tx, conversation_id, position, message).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

// ============================================================================
// Row Helpers
// ============================================================================

async fn next_position(conn: &mut SqliteConnection, conversation_id: Uuid) -> AppResult<i64> {
    let row = sqlx::query(
        "SELECT COALESCE(MAX(position), -1) + 1 AS next FROM chat_messages WHERE conversation_id = $1",
    )
    .bind(conversation_id.to_string())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to read message position: {e}")))?;

    Ok(row.try_get("next")?)
}

async fn insert_message(
    conn: &mut SqliteConnection,
    conversation_id: Uuid,
    position: i64,
    message: &MessageRecord,
) -> AppResult<()> {
    let tools_used = message
        .tools_used
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    sqlx::query(
        r"
        INSERT INTO chat_messages (id, conversation_id, position, role, content, tools_used, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(message.id.to_string())
    .bind(conversation_id.to_string())
    .bind(position)
    .bind(message.role.as_str())
    .bind(&message.content)
    .bind(tools_used)
    .bind(to_db_time(message.created_at))
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to add message: {e}")))?;

    Ok(())
}

fn conversation_from_row(row: &SqliteRow) -> AppResult<ConversationRecord> {
    Ok(ConversationRecord {
        id: uuid_col(row, "id")?,
        owner_id: uuid_col(row, "owner_id")?,
        title: row.try_get("title")?,
        created_at: time_col(row, "created_at")?,
        updated_at: time_col(row, "updated_at")?,
    })
}

fn message_from_row(row: &SqliteRow) -> AppResult<MessageRecord> {
    let role: String = row.try_get("role")?;
    let tools_used: Option<String> = row.try_get("tools_used")?;
    let tools_used = tools_used
        .as_deref()
        .map(serde_json::from_str::<Vec<ToolUsage>>)
        .transpose()?;

    Ok(MessageRecord {
        id: uuid_col(row, "id")?,
        role: role.parse::<StoredRole>()?,
        content: row.try_get("content")?,
        tools_used,
        created_at: time_col(row, "created_at")?,
    })
}
