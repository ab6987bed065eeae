// ABOUTME: Module containing the assistant tool implementations organized by entity.
// ABOUTME: Shared argument decoding, project lookup, and batch result helpers live here.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # Tool Implementations
//!
//! - `tasks` - `create_task` (batch), `update_task`
//! - `events` - `create_event` (batch)
//! - `notes` - `create_note`
//! - `projects` - `create_project`
//! - `queries` - `query_entities`, `search_entities`
//! - `delete` - `delete_entity`
//! - `statistics` - `get_statistics`

mod delete;
mod events;
mod notes;
mod projects;
mod queries;
mod statistics;
mod tasks;

pub use delete::DeleteEntityTool;
pub use events::CreateEventTool;
pub use notes::CreateNoteTool;
pub use projects::CreateProjectTool;
pub use queries::{QueryEntitiesTool, SearchEntitiesTool};
pub use statistics::GetStatisticsTool;
pub use tasks::{CreateTaskTool, UpdateTaskTool};

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::constants::limits::{QUERY_DEFAULT_ROWS, QUERY_MAX_ROWS};
use crate::errors::{AppError, AppResult, ToolError};
use crate::models::{EntityKind, ToolResult};
use crate::tools::context::ToolExecutionContext;

// ============================================================================
// Argument helpers
// ============================================================================

/// Decode tool arguments into the handler's typed input
fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> AppResult<T> {
    serde_json::from_value(args)
        .map_err(|e| ToolError::invalid_parameter(tool, "arguments", e.to_string()).into())
}

/// Trimmed, non-empty text
fn required_text(tool: &str, field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ToolError::missing_parameter(tool, field).into());
    }
    Ok(value.to_owned())
}

/// Trimmed text, `None` when blank
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Trimmed, de-duplicated, non-empty tags in input order
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !cleaned.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            cleaned.push(tag.to_owned());
        }
    }
    cleaned
}

/// Requested row count, defaulted and capped
fn clamp_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(QUERY_DEFAULT_ROWS)
        .clamp(1, QUERY_MAX_ROWS)
}

/// Resolve an optional project reference and make sure the project exists.
///
/// The outer error is a store failure; the inner one is the failed result to
/// hand back to the model.
async fn resolve_project(
    ctx: &ToolExecutionContext,
    reference: Option<&str>,
) -> AppResult<Result<Option<Uuid>, ToolResult>> {
    let reference = reference.map(str::trim).filter(|r| !r.is_empty());
    let project_id = match ctx.resolver().resolve_optional(EntityKind::Project, reference).await? {
        Ok(Some(id)) => id,
        other => return Ok(other),
    };

    if ctx
        .store
        .label_of(ctx.owner_id, EntityKind::Project, project_id)
        .await?
        .is_none()
    {
        return Ok(Err(ToolResult::failure(format!(
            "No project found matching '{}'",
            reference.unwrap_or_default()
        ))));
    }
    Ok(Ok(Some(project_id)))
}

// ============================================================================
// Batch helpers
// ============================================================================

/// Items of a batch argument. A lone object carrying `title` is accepted
/// as a one-item batch.
fn batch_items(tool: &str, key: &str, mut args: Value) -> AppResult<Vec<Value>> {
    match args.get_mut(key).map(Value::take) {
        Some(Value::Array(items)) if !items.is_empty() => Ok(items),
        Some(Value::Array(_)) => Err(AppError::invalid_input(format!(
            "'{key}' must contain at least one item"
        ))),
        Some(_) => Err(ToolError::invalid_parameter(tool, key, "expected an array").into()),
        None if args.get("title").is_some() => Ok(vec![args]),
        None => Err(ToolError::missing_parameter(tool, key).into()),
    }
}

/// Collects per-item outcomes of a batch create
struct BatchOutcome {
    noun: &'static str,
    created: Vec<Value>,
    errors: Vec<Value>,
}

impl BatchOutcome {
    const fn new(noun: &'static str) -> Self {
        Self {
            noun,
            created: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Failed items keep the resolver's `matches` so the model can offer the choices
    fn record(&mut self, index: usize, item: &Value, outcome: Result<Value, ToolResult>) {
        match outcome {
            Ok(summary) => self.created.push(summary),
            Err(failed) => {
                let mut entry = json!({
                    "index": index,
                    "title": item.get("title").and_then(Value::as_str),
                    "error": failed.error.unwrap_or_else(|| "operation failed".to_owned()),
                });
                if let Some(matches) = failed
                    .data
                    .and_then(|mut data| data.get_mut("matches").map(Value::take))
                {
                    entry["matches"] = matches;
                }
                self.errors.push(entry);
            }
        }
    }

    /// `success` only when every item was created
    fn finish(self) -> ToolResult {
        let total = self.created.len() + self.errors.len();
        let created = self.created.len();
        let failed = self.errors.len();
        let mut map = Map::new();
        map.insert("created".to_owned(), json!(created));
        map.insert(self.noun.to_owned(), Value::Array(self.created));
        map.insert("errors".to_owned(), Value::Array(self.errors));
        let data = Value::Object(map);

        if failed == 0 {
            ToolResult::ok(data)
        } else {
            ToolResult::failure_with_data(
                format!("{created} of {total} {} created, {failed} failed", self.noun),
                data,
            )
        }
    }
}

/// Batch item failure from a validation or store error
fn item_failure(error: AppError) -> ToolResult {
    ToolResult::failure(error.message)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 20);
        assert_eq!(clamp_limit(Some(1000)), 50);
        assert_eq!(clamp_limit(Some(0)), 1);
    }

    #[test]
    fn test_clean_tags_dedupes_case_insensitively() {
        let tags = vec![" Work ".to_owned(), "work".to_owned(), String::new(), "home".to_owned()];
        assert_eq!(clean_tags(tags), vec!["Work".to_owned(), "home".to_owned()]);
    }

    #[test]
    fn test_batch_items_accepts_single_object() {
        let items = batch_items("create_task", "tasks", json!({"title": "Solo"})).unwrap();
        assert_eq!(items.len(), 1);
        assert!(batch_items("create_task", "tasks", json!({"tasks": []})).is_err());
        assert!(batch_items("create_task", "tasks", json!({})).is_err());
    }

    #[test]
    fn test_batch_outcome_partial_failure() {
        let mut outcome = BatchOutcome::new("tasks");
        outcome.record(0, &json!({"title": "a"}), Ok(json!({"title": "a"})));
        outcome.record(1, &json!({"title": ""}), Err(ToolResult::failure("title is required")));
        outcome.record(
            2,
            &json!({"title": "c"}),
            Err(ToolResult::failure_with_data(
                "2 projects match 'casa'",
                json!({"matches": [{"id": 1, "title": "Casa A"}, {"id": 2, "title": "Casa B"}]}),
            )),
        );
        let result = outcome.finish();

        assert!(!result.success);
        let data = result.data.unwrap();
        assert_eq!(data["created"], 1);
        assert_eq!(data["errors"][0]["index"], 1);
        assert_eq!(data["errors"][0]["error"], "title is required");
        assert!(data["errors"][0].get("matches").is_none());
        assert_eq!(data["errors"][1]["matches"].as_array().unwrap().len(), 2);
    }
}
