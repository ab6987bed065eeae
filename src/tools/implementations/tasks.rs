// ABOUTME: Task tools: batch create_task and reference-based update_task.
// ABOUTME: Dates are read in the caller's timezone; project references are resolved, never guessed.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::constants::tools::{CREATE_TASK, UPDATE_TASK};
use crate::errors::{AppError, AppResult};
use crate::models::{EntityKind, TaskPriority, TaskRecord, TaskStatus, ToolResult};
use crate::tools::context::ToolExecutionContext;
use crate::tools::traits::{AgentTool, ToolCapabilities};
use crate::workspace::{NewTask, TaskUpdate};

use super::{
    batch_items, clean_tags, item_failure, optional_text, parse_args, required_text,
    resolve_project, BatchOutcome,
};

/// Minimal projection returned to the model
pub(super) fn task_summary(task: &TaskRecord, ctx: &ToolExecutionContext) -> Value {
    json!({
        "id": task.id,
        "title": task.title,
        "status": task.status,
        "priority": task.priority,
        "due_date": task.due_date.map(|d| ctx.local(d)),
        "project_id": task.project_id,
        "tags": task.tags,
    })
}

fn status_schema() -> Value {
    json!({
        "type": "string",
        "enum": TaskStatus::ALL.map(TaskStatus::as_str),
    })
}

fn priority_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["low", "medium", "high", "urgent"],
    })
}

// ============================================================================
// CreateTaskTool
// ============================================================================

#[derive(Debug, Deserialize)]
struct TaskItem {
    title: String,
    description: Option<String>,
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    due_date: Option<String>,
    project: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Creates one or more tasks; each item succeeds or fails on its own
pub struct CreateTaskTool;

impl CreateTaskTool {
    async fn create_one(ctx: &ToolExecutionContext, item: Value) -> Result<Value, ToolResult> {
        let item: TaskItem = parse_args(CREATE_TASK, item).map_err(item_failure)?;
        let title = required_text(CREATE_TASK, "title", &item.title).map_err(item_failure)?;
        let due_date = item
            .due_date
            .as_deref()
            .map(|raw| ctx.parse_date(raw)?.deadline(ctx.timezone))
            .transpose()
            .map_err(item_failure)?;
        let project_id = resolve_project(ctx, item.project.as_deref())
            .await
            .map_err(item_failure)??;

        let new_task = NewTask {
            title,
            description: optional_text(item.description),
            status: item.status.unwrap_or_default(),
            priority: item.priority.unwrap_or_default(),
            due_date,
            project_id,
            tags: clean_tags(item.tags),
        };
        let task = ctx
            .store
            .create_task(ctx.owner_id, &new_task)
            .await
            .map_err(item_failure)?;
        debug!(task_id = %task.id, "Created task");
        Ok(task_summary(&task, ctx))
    }
}

#[async_trait]
impl AgentTool for CreateTaskTool {
    fn name(&self) -> &'static str {
        CREATE_TASK
    }

    fn description(&self) -> &'static str {
        "Create one or more tasks. Pass every task in the `tasks` array, even a single one. \
         Each task is created independently; failures are listed in `errors`."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tasks": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string", "description": "Short task title"},
                            "description": {"type": "string"},
                            "status": status_schema(),
                            "priority": priority_schema(),
                            "due_date": {
                                "type": "string",
                                "description": "Local date YYYY-MM-DD or date-time YYYY-MM-DDTHH:MM in the user's timezone"
                            },
                            "project": {"type": "string", "description": "Project name or id"},
                            "tags": {"type": "array", "items": {"type": "string"}}
                        },
                        "required": ["title"]
                    }
                }
            },
            "required": ["tasks"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::WRITES_DATA
    }

    async fn execute(&self, args: Value, ctx: &ToolExecutionContext) -> AppResult<ToolResult> {
        let items = batch_items(CREATE_TASK, "tasks", args)?;
        let mut outcome = BatchOutcome::new("tasks");
        for (index, item) in items.into_iter().enumerate() {
            let result = Self::create_one(ctx, item.clone()).await;
            outcome.record(index, &item, result);
        }
        Ok(outcome.finish())
    }
}

// ============================================================================
// UpdateTaskTool
// ============================================================================

#[derive(Debug, Deserialize)]
struct UpdateTaskInput {
    #[serde(alias = "id", alias = "reference")]
    task: String,
    title: Option<String>,
    description: Option<String>,
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    due_date: Option<String>,
    project: Option<String>,
}

/// Updates one task found by id or title
pub struct UpdateTaskTool;

#[async_trait]
impl AgentTool for UpdateTaskTool {
    fn name(&self) -> &'static str {
        UPDATE_TASK
    }

    fn description(&self) -> &'static str {
        "Update a task found by id or by words from its title. Only the fields given are changed. \
         Setting status to done marks the task completed. If several tasks match, nothing is \
         changed and the candidates are returned in `matches`."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task": {"type": "string", "description": "Task id or words from its title"},
                "title": {"type": "string"},
                "description": {"type": "string"},
                "status": status_schema(),
                "priority": priority_schema(),
                "due_date": {
                    "type": "string",
                    "description": "Local date YYYY-MM-DD or date-time YYYY-MM-DDTHH:MM in the user's timezone"
                },
                "project": {"type": "string", "description": "Project name or id to move the task to"}
            },
            "required": ["task"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA | ToolCapabilities::WRITES_DATA
    }

    async fn execute(&self, args: Value, ctx: &ToolExecutionContext) -> AppResult<ToolResult> {
        let input: UpdateTaskInput = parse_args(UPDATE_TASK, args)?;
        let reference = required_text(UPDATE_TASK, "task", &input.task)?;

        let mut update = TaskUpdate {
            title: optional_text(input.title),
            description: optional_text(input.description),
            status: input.status,
            priority: input.priority,
            due_date: input
                .due_date
                .as_deref()
                .map(|raw| ctx.parse_date(raw)?.deadline(ctx.timezone))
                .transpose()?,
            project_id: None,
        };
        if update.is_empty() && input.project.is_none() {
            return Err(AppError::invalid_input(
                "Nothing to update: give at least one of title, description, status, priority, due_date, project",
            ));
        }

        let resolution = ctx.resolver().resolve(EntityKind::Task, &reference).await?;
        let task_id = match resolution.into_id(EntityKind::Task, &reference) {
            Ok(id) => id,
            Err(failed) => return Ok(failed),
        };
        update.project_id = match resolve_project(ctx, input.project.as_deref()).await? {
            Ok(project_id) => project_id,
            Err(failed) => return Ok(failed),
        };

        match ctx.store.update_task(ctx.owner_id, task_id, &update).await? {
            Some(task) => Ok(ToolResult::ok(json!({
                "updated": true,
                "task": task_summary(&task, ctx),
                "completed_at": task.completed_at.map(|d| ctx.local(d)),
            }))),
            None => Ok(ToolResult::failure(format!(
                "No task found matching '{reference}'"
            ))),
        }
    }
}
