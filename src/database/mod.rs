// ABOUTME: SQLite database handle, migrations, and column helpers
// ABOUTME: Owns the connection pool shared by the chat store and the workspace store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # Database
//!
//! All persistence goes through one [`Database`] wrapping an sqlx SQLite pool.
//! Schemas are created in code at startup (`CREATE TABLE IF NOT EXISTS`).
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings so that textual
//! comparison in SQL matches chronological order.

/// Conversation and message persistence
pub mod chat;
/// Append-only token usage ledger
pub mod usage;
/// Tasks, events, notes, and projects
pub mod workspace;

pub use chat::{ChatManager, TurnRecord};
pub use usage::UsageManager;
pub use workspace::SqliteWorkspaceStore;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Connections kept by a file-backed pool
const MAX_CONNECTIONS: u32 = 5;

/// SQLite database handle
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to `database_url`, creating the file if needed, and migrate
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or a
    /// migration fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid DATABASE_URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        info!(url = %database_url, "Database ready");
        Ok(db)
    }

    /// Private in-memory database (single connection so the data survives)
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails.
    pub async fn in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::config(format!("Invalid in-memory URL: {e}")))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open in-memory database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Conversation store over this database
    #[must_use]
    pub fn chat(&self) -> ChatManager {
        ChatManager::new(self.pool.clone())
    }

    /// Usage ledger over this database
    #[must_use]
    pub fn usage(&self) -> UsageManager {
        UsageManager::new(self.pool.clone())
    }

    /// Workspace entity store over this database
    #[must_use]
    pub fn workspace(&self) -> SqliteWorkspaceStore {
        SqliteWorkspaceStore::new(self.pool.clone())
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any schema statement fails.
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_workspace().await?;
        self.migrate_chat().await?;
        self.migrate_usage().await?;
        Ok(())
    }

    async fn run_schema(&self, statements: &[&str]) -> AppResult<()> {
        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        }
        Ok(())
    }
}

// ============================================================================
// Column Helpers
// ============================================================================

/// Fixed-width UTC text form used in every timestamp column
pub(crate) fn to_db_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_db_time(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid timestamp '{raw}' in database: {e}")))
}

pub(crate) fn uuid_col(row: &SqliteRow, column: &str) -> AppResult<Uuid> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw)
        .map_err(|e| AppError::database(format!("Invalid id '{raw}' in column {column}: {e}")))
}

pub(crate) fn opt_uuid_col(row: &SqliteRow, column: &str) -> AppResult<Option<Uuid>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|value| {
        Uuid::parse_str(&value).map_err(|e| {
            AppError::database(format!("Invalid id '{value}' in column {column}: {e}"))
        })
    })
    .transpose()
}

pub(crate) fn time_col(row: &SqliteRow, column: &str) -> AppResult<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    parse_db_time(&raw)
}

pub(crate) fn opt_time_col(row: &SqliteRow, column: &str) -> AppResult<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.as_deref().map(parse_db_time).transpose()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_db_time_is_fixed_width_and_sortable() {
        let early = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 11, 2, 3, 4, 5).unwrap();
        let (a, b) = (to_db_time(early), to_db_time(late));

        assert_eq!(a, "2026-01-02T03:04:05.000000Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(parse_db_time(&a).unwrap(), early);
    }

    #[tokio::test]
    async fn test_in_memory_migrations_are_idempotent() {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();
    }
}
