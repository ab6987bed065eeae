// ABOUTME: Workspace entity types (tasks, events, notes, projects)
// ABOUTME: Entity kinds, task status and priority enums, and stored records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// The four kinds of entity a user owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// To-do item
    Task,
    /// Calendar event
    Event,
    /// Free-form note
    Note,
    /// Grouping for tasks, events, and notes
    Project,
}

impl EntityKind {
    /// Every kind, in catalog order
    pub const ALL: [Self; 4] = [Self::Task, Self::Event, Self::Note, Self::Project];

    /// Lowercase name used in tool inputs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Event => "event",
            Self::Note => "note",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().trim_end_matches('s') {
            "task" => Ok(Self::Task),
            "event" => Ok(Self::Event),
            "note" => Ok(Self::Note),
            "project" => Ok(Self::Project),
            _ => Err(AppError::invalid_input(format!(
                "Unknown entity type '{s}'. Expected one of: task, event, note, project"
            ))),
        }
    }
}

/// Task workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Todo,
    /// Being worked on
    InProgress,
    /// Finished
    #[serde(alias = "completed", alias = "complete")]
    Done,
    /// Dropped
    #[serde(alias = "canceled")]
    Cancelled,
}

impl TaskStatus {
    /// Every status, in workflow order
    pub const ALL: [Self; 4] = [Self::Todo, Self::InProgress, Self::Done, Self::Cancelled];

    /// Column value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the task still needs attention
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Todo | Self::InProgress)
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::invalid_input(format!(
                "Unknown task status '{other}'"
            ))),
        }
    }
}

/// Task urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Whenever
    Low,
    /// Normal
    #[default]
    Medium,
    /// Soon
    High,
    /// Now
    Urgent,
}

impl TaskPriority {
    /// Column value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(AppError::invalid_input(format!(
                "Unknown task priority '{other}'"
            ))),
        }
    }
}

/// A stored task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task ID
    pub id: Uuid,
    /// Owner
    pub owner_id: Uuid,
    /// Containing project
    pub project_id: Option<Uuid>,
    /// Title
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// Workflow state
    pub status: TaskStatus,
    /// Urgency
    pub priority: TaskPriority,
    /// Deadline
    pub due_date: Option<DateTime<Utc>>,
    /// Set when the task moves to done
    pub completed_at: Option<DateTime<Utc>>,
    /// Free labels
    pub tags: Vec<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

/// A stored calendar event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event ID
    pub id: Uuid,
    /// Owner
    pub owner_id: Uuid,
    /// Containing project
    pub project_id: Option<Uuid>,
    /// Title
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// Where it happens
    pub location: Option<String>,
    /// Start
    pub starts_at: DateTime<Utc>,
    /// End
    pub ends_at: Option<DateTime<Utc>>,
    /// Whole-day event
    pub all_day: bool,
    /// Free labels
    pub tags: Vec<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A stored note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    /// Note ID
    pub id: Uuid,
    /// Owner
    pub owner_id: Uuid,
    /// Containing project
    pub project_id: Option<Uuid>,
    /// Title
    pub title: String,
    /// Body text
    pub content: String,
    /// Free labels
    pub tags: Vec<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

/// A stored project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Project ID
    pub id: Uuid,
    /// Owner
    pub owner_id: Uuid,
    /// Display name
    pub name: String,
    /// Longer description
    pub description: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// One search hit: the entity's id and a label the user would recognize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCandidate {
    /// Entity ID
    pub id: Uuid,
    /// Title or name
    pub label: String,
}
