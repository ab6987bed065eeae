// ABOUTME: Append-only token usage ledger, one row per completed turn
// ABOUTME: Rows survive conversation deletion and are summed per user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{time_col, to_db_time, uuid_col, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{UsageRecord, UsageSummary};

impl Database {
    pub(super) async fn migrate_usage(&self) -> AppResult<()> {
        self.run_schema(&[
            r"
            CREATE TABLE IF NOT EXISTS chat_usage (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                conversation_id TEXT NOT NULL,
                model TEXT NOT NULL,
                input_tokens INTEGER NOT NULL,
                output_tokens INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_chat_usage_owner ON chat_usage(owner_id, created_at)",
        ])
        .await
    }
}

/// Insert one ledger row on an open connection or transaction
pub(super) async fn insert_usage(conn: &mut SqliteConnection, record: &UsageRecord) -> AppResult<()> {
    sqlx::query(
        r"
        INSERT INTO chat_usage (id, owner_id, conversation_id, model, input_tokens, output_tokens, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(record.id.to_string())
    .bind(record.owner_id.to_string())
    .bind(record.conversation_id.to_string())
    .bind(&record.model)
    .bind(record.input_tokens)
    .bind(record.output_tokens)
    .bind(to_db_time(record.created_at))
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to record usage: {e}")))?;

    Ok(())
}

/// Read side of the usage ledger
#[derive(Clone)]
pub struct UsageManager {
    pool: SqlitePool,
}

impl UsageManager {
    /// Create a new usage manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Totals for one user
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn summary(&self, owner_id: Uuid) -> AppResult<UsageSummary> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS turns,
                   COALESCE(SUM(input_tokens), 0) AS input_tokens,
                   COALESCE(SUM(output_tokens), 0) AS output_tokens
            FROM chat_usage
            WHERE owner_id = $1
            ",
        )
        .bind(owner_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to summarize usage: {e}")))?;

        let input_tokens: i64 = row.try_get("input_tokens")?;
        let output_tokens: i64 = row.try_get("output_tokens")?;
        Ok(UsageSummary {
            turns: row.try_get("turns")?,
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
        })
    }

    /// Most recent ledger rows for one user, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_usage(&self, owner_id: Uuid, limit: u32) -> AppResult<Vec<UsageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, owner_id, conversation_id, model, input_tokens, output_tokens, created_at
            FROM chat_usage
            WHERE owner_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2
            ",
        )
        .bind(owner_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list usage: {e}")))?;

        rows.iter()
            .map(|r| {
                Ok(UsageRecord {
                    id: uuid_col(r, "id")?,
                    owner_id: uuid_col(r, "owner_id")?,
                    conversation_id: uuid_col(r, "conversation_id")?,
                    model: r.try_get("model")?,
                    input_tokens: r.try_get("input_tokens")?,
                    output_tokens: r.try_get("output_tokens")?,
                    created_at: time_col(r, "created_at")?,
                })
            })
            .collect()
    }
}
