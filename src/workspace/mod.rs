// ABOUTME: Domain collaborator contract for tasks, events, notes, and projects
// ABOUTME: Owner-scoped CRUD, text search, and counters used by tools and statistics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # Workspace Store
//!
//! Tools never touch SQL directly. Everything they need from the productivity
//! suite goes through [`WorkspaceStore`], and every method takes the owner id
//! so one user's data cannot reach another user's tool calls.
//!
//! The store carries no validation rules of its own; tool inputs are checked
//! before they get here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::{
    EntityCandidate, EntityKind, EventRecord, NoteRecord, ProjectRecord, TaskPriority, TaskRecord,
    TaskStatus,
};

// ============================================================================
// Inputs
// ============================================================================

/// Fields of a task about to be created
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    /// Title
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// Initial status
    pub status: TaskStatus,
    /// Urgency
    pub priority: TaskPriority,
    /// Deadline
    pub due_date: Option<DateTime<Utc>>,
    /// Containing project
    pub project_id: Option<Uuid>,
    /// Free labels
    pub tags: Vec<String>,
}

/// Partial task update; `None` leaves the field unchanged
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New status
    pub status: Option<TaskStatus>,
    /// New priority
    pub priority: Option<TaskPriority>,
    /// New deadline
    pub due_date: Option<DateTime<Utc>>,
    /// Move to another project
    pub project_id: Option<Uuid>,
}

impl TaskUpdate {
    /// True when nothing would change
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.project_id.is_none()
    }
}

/// Fields of an event about to be created
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// Title
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// Where
    pub location: Option<String>,
    /// Start
    pub starts_at: DateTime<Utc>,
    /// End
    pub ends_at: Option<DateTime<Utc>>,
    /// Whole-day event
    pub all_day: bool,
    /// Containing project
    pub project_id: Option<Uuid>,
    /// Free labels
    pub tags: Vec<String>,
}

/// Fields of a note about to be created
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    /// Title
    pub title: String,
    /// Body
    pub content: String,
    /// Containing project
    pub project_id: Option<Uuid>,
    /// Free labels
    pub tags: Vec<String>,
}

/// Fields of a project about to be created
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    /// Display name
    pub name: String,
    /// Longer description
    pub description: Option<String>,
}

/// Task listing filter; every set field narrows the result
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Only this status
    pub status: Option<TaskStatus>,
    /// Only tasks in this project
    pub project_id: Option<Uuid>,
    /// Due at or after
    pub due_after: Option<DateTime<Utc>>,
    /// Due strictly before
    pub due_before: Option<DateTime<Utc>>,
}

/// Event listing filter
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Only events in this project
    pub project_id: Option<Uuid>,
    /// Starting at or after
    pub from: Option<DateTime<Utc>>,
    /// Starting strictly before
    pub to: Option<DateTime<Utc>>,
}

/// Which tasks [`WorkspaceStore::count_tasks`] counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCount {
    /// Status todo or in progress
    Open,
    /// Open with a due date before the instant
    Overdue(DateTime<Utc>),
    /// Open and due in `[from, to)`
    OpenDueBetween(DateTime<Utc>, DateTime<Utc>),
    /// Completed in `[from, to)`
    CompletedBetween(DateTime<Utc>, DateTime<Utc>),
}

// ============================================================================
// Store Contract
// ============================================================================

/// Owner-scoped access to the user's productivity data
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    /// Insert a task
    async fn create_task(&self, owner_id: Uuid, task: &NewTask) -> AppResult<TaskRecord>;

    /// Fetch one task
    async fn get_task(&self, owner_id: Uuid, task_id: Uuid) -> AppResult<Option<TaskRecord>>;

    /// Apply a partial update; `None` when the task does not exist for this owner.
    /// Moving to done stamps `completed_at`, moving away from done clears it.
    async fn update_task(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
        update: &TaskUpdate,
    ) -> AppResult<Option<TaskRecord>>;

    /// Insert an event
    async fn create_event(&self, owner_id: Uuid, event: &NewEvent) -> AppResult<EventRecord>;

    /// Insert a note
    async fn create_note(&self, owner_id: Uuid, note: &NewNote) -> AppResult<NoteRecord>;

    /// Insert a project
    async fn create_project(&self, owner_id: Uuid, project: &NewProject) -> AppResult<ProjectRecord>;

    /// Hard-delete one entity; `false` when nothing matched.
    /// Deleting a project detaches its tasks, events, and notes.
    async fn delete_entity(&self, owner_id: Uuid, kind: EntityKind, id: Uuid) -> AppResult<bool>;

    /// Title (or name) of an entity, if it exists for this owner
    async fn label_of(&self, owner_id: Uuid, kind: EntityKind, id: Uuid) -> AppResult<Option<String>>;

    /// Case-insensitive substring search over titles and names
    async fn search(
        &self,
        owner_id: Uuid,
        kind: EntityKind,
        text: &str,
        limit: u32,
    ) -> AppResult<Vec<EntityCandidate>>;

    /// Tasks matching `filter`, soonest due first
    async fn list_tasks(
        &self,
        owner_id: Uuid,
        filter: &TaskFilter,
        limit: u32,
    ) -> AppResult<Vec<TaskRecord>>;

    /// Events matching `filter`, earliest first
    async fn list_events(
        &self,
        owner_id: Uuid,
        filter: &EventFilter,
        limit: u32,
    ) -> AppResult<Vec<EventRecord>>;

    /// Notes, most recently updated first
    async fn list_notes(
        &self,
        owner_id: Uuid,
        project_id: Option<Uuid>,
        limit: u32,
    ) -> AppResult<Vec<NoteRecord>>;

    /// Projects by name
    async fn list_projects(&self, owner_id: Uuid, limit: u32) -> AppResult<Vec<ProjectRecord>>;

    /// Count tasks in one of the [`TaskCount`] buckets
    async fn count_tasks(&self, owner_id: Uuid, which: TaskCount) -> AppResult<i64>;

    /// Events starting in `[from, to)`
    async fn count_events_between(
        &self,
        owner_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<i64>;

    /// Task count per status, optionally for one project
    async fn task_status_breakdown(
        &self,
        owner_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<(TaskStatus, i64)>>;

    /// Number of projects
    async fn count_projects(&self, owner_id: Uuid) -> AppResult<i64>;
}
