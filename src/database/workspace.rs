// ABOUTME: SQLite implementation of the workspace store (tasks, events, notes, projects)
// ABOUTME: Tags are kept as JSON text; every statement is filtered by owner_id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{opt_time_col, opt_uuid_col, time_col, to_db_time, uuid_col, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{
    EntityCandidate, EntityKind, EventRecord, NoteRecord, ProjectRecord, TaskPriority, TaskRecord,
    TaskStatus,
};
use crate::workspace::{
    EventFilter, NewEvent, NewNote, NewProject, NewTask, TaskCount, TaskFilter, TaskUpdate,
    WorkspaceStore,
};

// ============================================================================
// Schema
// ============================================================================

impl Database {
    pub(super) async fn migrate_workspace(&self) -> AppResult<()> {
        self.run_schema(&[
            r"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                search_key TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'todo',
                priority TEXT NOT NULL DEFAULT 'medium',
                due_date TEXT,
                completed_at TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                search_key TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_tasks_owner_status ON tasks(owner_id, status)",
            r"
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
                title TEXT NOT NULL,
                description TEXT,
                location TEXT,
                starts_at TEXT NOT NULL,
                ends_at TEXT,
                all_day INTEGER NOT NULL DEFAULT 0,
                tags TEXT NOT NULL DEFAULT '[]',
                search_key TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_events_owner_start ON events(owner_id, starts_at)",
            r"
            CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                search_key TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        ])
        .await
    }
}

/// Table and label column searched for each kind
const fn search_target(kind: EntityKind) -> (&'static str, &'static str) {
    match kind {
        EntityKind::Task => ("tasks", "title"),
        EntityKind::Event => ("events", "title"),
        EntityKind::Note => ("notes", "title"),
        EntityKind::Project => ("projects", "name"),
    }
}

/// Unicode-lowercased label stored next to it; SQLite `LIKE` only folds ASCII
fn search_key(label: &str) -> String {
    label.to_lowercase()
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`
/// over `search_key`
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in search_key(text.trim()).chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// ============================================================================
// SQLite Store
// ============================================================================

/// Workspace store backed by the shared SQLite pool
#[derive(Clone)]
pub struct SqliteWorkspaceStore {
    pool: SqlitePool,
}

impl SqliteWorkspaceStore {
    /// Create a new store
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn count(&self, sql: &str, owner_id: Uuid, bounds: &[DateTime<Utc>]) -> AppResult<i64> {
        let mut query = sqlx::query(sql).bind(owner_id.to_string());
        for bound in bounds {
            query = query.bind(to_db_time(*bound));
        }
        let row = query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count rows: {e}")))?;
        Ok(row.try_get("n")?)
    }
}

#[async_trait]
impl WorkspaceStore for SqliteWorkspaceStore {
    async fn create_task(&self, owner_id: Uuid, task: &NewTask) -> AppResult<TaskRecord> {
        let now = Utc::now();
        let record = TaskRecord {
            id: Uuid::new_v4(),
            owner_id,
            project_id: task.project_id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            completed_at: (task.status == TaskStatus::Done).then_some(now),
            tags: task.tags.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO tasks (id, owner_id, project_id, title, description, status, priority,
                               due_date, completed_at, tags, search_key, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ",
        )
        .bind(record.id.to_string())
        .bind(owner_id.to_string())
        .bind(record.project_id.map(|id| id.to_string()))
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.status.as_str())
        .bind(record.priority.as_str())
        .bind(record.due_date.map(to_db_time))
        .bind(record.completed_at.map(to_db_time))
        .bind(serde_json::to_string(&record.tags)?)
        .bind(search_key(&record.title))
        .bind(to_db_time(now))
        .bind(to_db_time(now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create task: {e}")))?;

        Ok(record)
    }

    async fn get_task(&self, owner_id: Uuid, task_id: Uuid) -> AppResult<Option<TaskRecord>> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(task_id.to_string())
            .bind(owner_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get task: {e}")))?;

        row.as_ref().map(task_from_row).transpose()
    }

    async fn update_task(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
        update: &TaskUpdate,
    ) -> AppResult<Option<TaskRecord>> {
        let Some(mut task) = self.get_task(owner_id, task_id).await? else {
            return Ok(None);
        };
        let now = Utc::now();

        if let Some(title) = &update.title {
            task.title.clone_from(title);
        }
        if let Some(description) = &update.description {
            task.description = Some(description.clone());
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(project_id) = update.project_id {
            task.project_id = Some(project_id);
        }
        if let Some(status) = update.status {
            task.completed_at = match (task.status, status) {
                (TaskStatus::Done, TaskStatus::Done) => task.completed_at,
                (_, TaskStatus::Done) => Some(now),
                _ => None,
            };
            task.status = status;
        }
        task.updated_at = now;

        sqlx::query(
            r"
            UPDATE tasks
            SET project_id = $1, title = $2, description = $3, status = $4, priority = $5,
                due_date = $6, completed_at = $7, search_key = $8, updated_at = $9
            WHERE id = $10 AND owner_id = $11
            ",
        )
        .bind(task.project_id.map(|id| id.to_string()))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date.map(to_db_time))
        .bind(task.completed_at.map(to_db_time))
        .bind(search_key(&task.title))
        .bind(to_db_time(now))
        .bind(task_id.to_string())
        .bind(owner_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update task: {e}")))?;

        Ok(Some(task))
    }

    async fn create_event(&self, owner_id: Uuid, event: &NewEvent) -> AppResult<EventRecord> {
        let record = EventRecord {
            id: Uuid::new_v4(),
            owner_id,
            project_id: event.project_id,
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            all_day: event.all_day,
            tags: event.tags.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO events (id, owner_id, project_id, title, description, location,
                                starts_at, ends_at, all_day, tags, search_key, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(record.id.to_string())
        .bind(owner_id.to_string())
        .bind(record.project_id.map(|id| id.to_string()))
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.location)
        .bind(to_db_time(record.starts_at))
        .bind(record.ends_at.map(to_db_time))
        .bind(record.all_day)
        .bind(serde_json::to_string(&record.tags)?)
        .bind(search_key(&record.title))
        .bind(to_db_time(record.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create event: {e}")))?;

        Ok(record)
    }

    async fn create_note(&self, owner_id: Uuid, note: &NewNote) -> AppResult<NoteRecord> {
        let now = Utc::now();
        let record = NoteRecord {
            id: Uuid::new_v4(),
            owner_id,
            project_id: note.project_id,
            title: note.title.clone(),
            content: note.content.clone(),
            tags: note.tags.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO notes (id, owner_id, project_id, title, content, tags, search_key,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(record.id.to_string())
        .bind(owner_id.to_string())
        .bind(record.project_id.map(|id| id.to_string()))
        .bind(&record.title)
        .bind(&record.content)
        .bind(serde_json::to_string(&record.tags)?)
        .bind(search_key(&record.title))
        .bind(to_db_time(now))
        .bind(to_db_time(now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create note: {e}")))?;

        Ok(record)
    }

    async fn create_project(&self, owner_id: Uuid, project: &NewProject) -> AppResult<ProjectRecord> {
        let record = ProjectRecord {
            id: Uuid::new_v4(),
            owner_id,
            name: project.name.clone(),
            description: project.description.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO projects (id, owner_id, name, description, search_key, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(record.id.to_string())
        .bind(owner_id.to_string())
        .bind(&record.name)
        .bind(&record.description)
        .bind(search_key(&record.name))
        .bind(to_db_time(record.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create project: {e}")))?;

        Ok(record)
    }

    async fn delete_entity(&self, owner_id: Uuid, kind: EntityKind, id: Uuid) -> AppResult<bool> {
        let (table, _) = search_target(kind);
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1 AND owner_id = $2"))
            .bind(id.to_string())
            .bind(owner_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete {kind}: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn label_of(&self, owner_id: Uuid, kind: EntityKind, id: Uuid) -> AppResult<Option<String>> {
        let (table, column) = search_target(kind);
        let row = sqlx::query(&format!(
            "SELECT {column} AS label FROM {table} WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to look up {kind}: {e}")))?;

        row.map(|r| r.try_get("label")).transpose().map_err(AppError::from)
    }

    async fn search(
        &self,
        owner_id: Uuid,
        kind: EntityKind,
        text: &str,
        limit: u32,
    ) -> AppResult<Vec<EntityCandidate>> {
        let (table, column) = search_target(kind);
        let rows = sqlx::query(&format!(
            r"
            SELECT id, {column} AS label FROM {table}
            WHERE owner_id = $1 AND search_key LIKE $2 ESCAPE '\'
            ORDER BY {column} COLLATE NOCASE, created_at, id
            LIMIT $3
            "
        ))
        .bind(owner_id.to_string())
        .bind(like_pattern(text))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to search {kind}s: {e}")))?;

        rows.iter()
            .map(|r| {
                Ok(EntityCandidate {
                    id: uuid_col(r, "id")?,
                    label: r.try_get("label")?,
                })
            })
            .collect()
    }

    async fn list_tasks(
        &self,
        owner_id: Uuid,
        filter: &TaskFilter,
        limit: u32,
    ) -> AppResult<Vec<TaskRecord>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM tasks
            WHERE owner_id = ?1
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR project_id = ?3)
              AND (?4 IS NULL OR due_date >= ?4)
              AND (?5 IS NULL OR due_date < ?5)
            ORDER BY due_date IS NULL, due_date, created_at, id
            LIMIT ?6
            ",
        )
        .bind(owner_id.to_string())
        .bind(filter.status.map(TaskStatus::as_str))
        .bind(filter.project_id.map(|id| id.to_string()))
        .bind(filter.due_after.map(to_db_time))
        .bind(filter.due_before.map(to_db_time))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list tasks: {e}")))?;

        rows.iter().map(task_from_row).collect()
    }

    async fn list_events(
        &self,
        owner_id: Uuid,
        filter: &EventFilter,
        limit: u32,
    ) -> AppResult<Vec<EventRecord>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM events
            WHERE owner_id = ?1
              AND (?2 IS NULL OR project_id = ?2)
              AND (?3 IS NULL OR starts_at >= ?3)
              AND (?4 IS NULL OR starts_at < ?4)
            ORDER BY starts_at, id
            LIMIT ?5
            ",
        )
        .bind(owner_id.to_string())
        .bind(filter.project_id.map(|id| id.to_string()))
        .bind(filter.from.map(to_db_time))
        .bind(filter.to.map(to_db_time))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list events: {e}")))?;

        rows.iter().map(event_from_row).collect()
    }

    async fn list_notes(
        &self,
        owner_id: Uuid,
        project_id: Option<Uuid>,
        limit: u32,
    ) -> AppResult<Vec<NoteRecord>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM notes
            WHERE owner_id = ?1 AND (?2 IS NULL OR project_id = ?2)
            ORDER BY updated_at DESC, id
            LIMIT ?3
            ",
        )
        .bind(owner_id.to_string())
        .bind(project_id.map(|id| id.to_string()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list notes: {e}")))?;

        rows.iter().map(note_from_row).collect()
    }

    async fn list_projects(&self, owner_id: Uuid, limit: u32) -> AppResult<Vec<ProjectRecord>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM projects
            WHERE owner_id = $1
            ORDER BY name COLLATE NOCASE, id
            LIMIT $2
            ",
        )
        .bind(owner_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list projects: {e}")))?;

        rows.iter()
            .map(|r| {
                Ok(ProjectRecord {
                    id: uuid_col(r, "id")?,
                    owner_id: uuid_col(r, "owner_id")?,
                    name: r.try_get("name")?,
                    description: r.try_get("description")?,
                    created_at: time_col(r, "created_at")?,
                })
            })
            .collect()
    }

    async fn count_tasks(&self, owner_id: Uuid, which: TaskCount) -> AppResult<i64> {
        const OPEN: &str = "status IN ('todo', 'in_progress')";
        match which {
            TaskCount::Open => {
                let sql = format!("SELECT COUNT(*) AS n FROM tasks WHERE owner_id = $1 AND {OPEN}");
                self.count(&sql, owner_id, &[]).await
            }
            TaskCount::Overdue(now) => {
                let sql = format!(
                    "SELECT COUNT(*) AS n FROM tasks WHERE owner_id = $1 AND {OPEN} \
                     AND due_date IS NOT NULL AND due_date < $2"
                );
                self.count(&sql, owner_id, &[now]).await
            }
            TaskCount::OpenDueBetween(from, to) => {
                let sql = format!(
                    "SELECT COUNT(*) AS n FROM tasks WHERE owner_id = $1 AND {OPEN} \
                     AND due_date >= $2 AND due_date < $3"
                );
                self.count(&sql, owner_id, &[from, to]).await
            }
            TaskCount::CompletedBetween(from, to) => {
                let sql = "SELECT COUNT(*) AS n FROM tasks WHERE owner_id = $1 AND status = 'done' \
                           AND completed_at >= $2 AND completed_at < $3";
                self.count(sql, owner_id, &[from, to]).await
            }
        }
    }

    async fn count_events_between(
        &self,
        owner_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<i64> {
        self.count(
            "SELECT COUNT(*) AS n FROM events WHERE owner_id = $1 AND starts_at >= $2 AND starts_at < $3",
            owner_id,
            &[from, to],
        )
        .await
    }

    async fn task_status_breakdown(
        &self,
        owner_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<(TaskStatus, i64)>> {
        let rows = sqlx::query(
            r"
            SELECT status, COUNT(*) AS n FROM tasks
            WHERE owner_id = ?1 AND (?2 IS NULL OR project_id = ?2)
            GROUP BY status
            ",
        )
        .bind(owner_id.to_string())
        .bind(project_id.map(|id| id.to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to group tasks by status: {e}")))?;

        let mut counts = Vec::with_capacity(TaskStatus::ALL.len());
        for status in TaskStatus::ALL {
            let mut n = 0;
            for row in &rows {
                let raw: String = row.try_get("status")?;
                if raw == status.as_str() {
                    n = row.try_get("n")?;
                }
            }
            counts.push((status, n));
        }
        Ok(counts)
    }

    async fn count_projects(&self, owner_id: Uuid) -> AppResult<i64> {
        self.count(
            "SELECT COUNT(*) AS n FROM projects WHERE owner_id = $1",
            owner_id,
            &[],
        )
        .await
    }
}

// ============================================================================
// Row Helpers
// ============================================================================

fn tags_col(row: &SqliteRow) -> AppResult<Vec<String>> {
    let raw: String = row.try_get("tags")?;
    Ok(serde_json::from_str(&raw)?)
}

fn enum_col<T: FromStr<Err = AppError>>(row: &SqliteRow, column: &str) -> AppResult<T> {
    let raw: String = row.try_get(column)?;
    raw.parse::<T>()
        .map_err(|e| AppError::database(format!("Invalid {column} in database: {}", e.message)))
}

fn task_from_row(row: &SqliteRow) -> AppResult<TaskRecord> {
    Ok(TaskRecord {
        id: uuid_col(row, "id")?,
        owner_id: uuid_col(row, "owner_id")?,
        project_id: opt_uuid_col(row, "project_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: enum_col::<TaskStatus>(row, "status")?,
        priority: enum_col::<TaskPriority>(row, "priority")?,
        due_date: opt_time_col(row, "due_date")?,
        completed_at: opt_time_col(row, "completed_at")?,
        tags: tags_col(row)?,
        created_at: time_col(row, "created_at")?,
        updated_at: time_col(row, "updated_at")?,
    })
}

fn event_from_row(row: &SqliteRow) -> AppResult<EventRecord> {
    Ok(EventRecord {
        id: uuid_col(row, "id")?,
        owner_id: uuid_col(row, "owner_id")?,
        project_id: opt_uuid_col(row, "project_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        location: row.try_get("location")?,
        starts_at: time_col(row, "starts_at")?,
        ends_at: opt_time_col(row, "ends_at")?,
        all_day: row.try_get("all_day")?,
        tags: tags_col(row)?,
        created_at: time_col(row, "created_at")?,
    })
}

fn note_from_row(row: &SqliteRow) -> AppResult<NoteRecord> {
    Ok(NoteRecord {
        id: uuid_col(row, "id")?,
        owner_id: uuid_col(row, "owner_id")?,
        project_id: opt_uuid_col(row, "project_id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        tags: tags_col(row)?,
        created_at: time_col(row, "created_at")?,
        updated_at: time_col(row, "updated_at")?,
    })
}
