// ABOUTME: Read-only tools: filtered listing per entity kind and free-text search.
// ABOUTME: Result counts are capped so a broad query cannot flood the model context.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::constants::tools::{QUERY_ENTITIES, SEARCH_ENTITIES};
use crate::errors::{AppError, AppResult};
use crate::models::{EntityKind, TaskStatus, ToolResult};
use crate::tools::context::ToolExecutionContext;
use crate::tools::traits::{AgentTool, ToolCapabilities};
use crate::workspace::{EventFilter, TaskFilter};

use super::events::event_summary;
use super::notes::note_summary;
use super::projects::project_summary;
use super::tasks::task_summary;
use super::{clamp_limit, parse_args, required_text, resolve_project};

fn kind_schema() -> Value {
    json!({
        "type": "string",
        "enum": EntityKind::ALL.map(EntityKind::as_str),
    })
}

// ============================================================================
// QueryEntitiesTool
// ============================================================================

#[derive(Debug, Deserialize)]
struct QueryInput {
    #[serde(alias = "type", alias = "entity_type")]
    kind: String,
    status: Option<TaskStatus>,
    project: Option<String>,
    from: Option<String>,
    to: Option<String>,
    limit: Option<u32>,
}

/// Lists entities of one kind with optional filters
pub struct QueryEntitiesTool;

impl QueryEntitiesTool {
    /// `from` is inclusive from the start of its day, `to` runs through the end of its day
    fn window(
        ctx: &ToolExecutionContext,
        input: &QueryInput,
    ) -> AppResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        let from = input
            .from
            .as_deref()
            .map(|raw| ctx.parse_date(raw)?.start(ctx.timezone))
            .transpose()?;
        let to = input
            .to
            .as_deref()
            .map(|raw| ctx.parse_date(raw)?.end(ctx.timezone))
            .transpose()?;
        if let (Some(from), Some(to)) = (from, to) {
            if to < from {
                return Err(AppError::invalid_input("'to' must not be before 'from'"));
            }
        }
        Ok((from, to))
    }
}

#[async_trait]
impl AgentTool for QueryEntitiesTool {
    fn name(&self) -> &'static str {
        QUERY_ENTITIES
    }

    fn description(&self) -> &'static str {
        "List tasks, events, notes, or projects. Tasks can be filtered by status, project, and \
         due date range (`from`/`to`); events by project and start range; notes by project."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "kind": kind_schema(),
                "status": {
                    "type": "string",
                    "enum": TaskStatus::ALL.map(TaskStatus::as_str),
                    "description": "Tasks only"
                },
                "project": {"type": "string", "description": "Project name or id"},
                "from": {"type": "string", "description": "Local date or date-time, inclusive"},
                "to": {"type": "string", "description": "Local date or date-time, inclusive of that day"},
                "limit": {"type": "integer", "minimum": 1, "maximum": 50}
            },
            "required": ["kind"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA
    }

    async fn execute(&self, args: Value, ctx: &ToolExecutionContext) -> AppResult<ToolResult> {
        let input: QueryInput = parse_args(QUERY_ENTITIES, args)?;
        let kind: EntityKind = input.kind.parse()?;
        if input.status.is_some() && kind != EntityKind::Task {
            return Err(AppError::invalid_input("'status' only applies to tasks"));
        }
        let (from, to) = Self::window(ctx, &input)?;
        if kind == EntityKind::Project && (from.is_some() || to.is_some() || input.project.is_some()) {
            return Err(AppError::invalid_input(
                "Projects can only be listed without filters",
            ));
        }
        let project_id = match resolve_project(ctx, input.project.as_deref()).await? {
            Ok(project_id) => project_id,
            Err(failed) => return Ok(failed),
        };
        let limit = clamp_limit(input.limit);

        let items: Vec<Value> = match kind {
            EntityKind::Task => {
                let filter = TaskFilter {
                    status: input.status,
                    project_id,
                    due_after: from,
                    due_before: to,
                };
                ctx.store
                    .list_tasks(ctx.owner_id, &filter, limit)
                    .await?
                    .iter()
                    .map(|t| task_summary(t, ctx))
                    .collect()
            }
            EntityKind::Event => {
                let filter = EventFilter {
                    project_id,
                    from,
                    to,
                };
                ctx.store
                    .list_events(ctx.owner_id, &filter, limit)
                    .await?
                    .iter()
                    .map(|e| event_summary(e, ctx))
                    .collect()
            }
            EntityKind::Note => ctx
                .store
                .list_notes(ctx.owner_id, project_id, limit)
                .await?
                .iter()
                .map(|n| note_summary(n, ctx))
                .collect(),
            EntityKind::Project => ctx
                .store
                .list_projects(ctx.owner_id, limit)
                .await?
                .iter()
                .map(project_summary)
                .collect(),
        };

        Ok(ToolResult::ok(json!({
            "kind": kind,
            "count": items.len(),
            "items": items,
        })))
    }
}

// ============================================================================
// SearchEntitiesTool
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchInput {
    #[serde(alias = "text", alias = "q")]
    query: String,
    #[serde(alias = "type", alias = "entity_type")]
    kind: Option<String>,
    limit: Option<u32>,
}

/// Finds entities whose title or name contains the query text
pub struct SearchEntitiesTool;

#[async_trait]
impl AgentTool for SearchEntitiesTool {
    fn name(&self) -> &'static str {
        SEARCH_ENTITIES
    }

    fn description(&self) -> &'static str {
        "Search titles and names for the given text, in one kind of entity or in all of them. \
         Use it to find the id of something the user mentions."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "kind": kind_schema(),
                "limit": {"type": "integer", "minimum": 1, "maximum": 50}
            },
            "required": ["query"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA
    }

    async fn execute(&self, args: Value, ctx: &ToolExecutionContext) -> AppResult<ToolResult> {
        let input: SearchInput = parse_args(SEARCH_ENTITIES, args)?;
        let query = required_text(SEARCH_ENTITIES, "query", &input.query)?;
        let kinds = match input.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            Some(kind) => vec![kind.parse::<EntityKind>()?],
            None => EntityKind::ALL.to_vec(),
        };
        let limit = clamp_limit(input.limit);

        let mut results = Vec::new();
        for kind in kinds {
            for hit in ctx.store.search(ctx.owner_id, kind, &query, limit).await? {
                results.push(json!({
                    "kind": kind,
                    "id": hit.id,
                    "title": hit.label,
                }));
            }
        }
        results.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(ToolResult::ok(json!({
            "query": query,
            "count": results.len(),
            "results": results,
        })))
    }
}
