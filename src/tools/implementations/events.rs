// ABOUTME: Event tool: batch create_event with local-time parsing and all-day detection.
// ABOUTME: A bare date start makes an all-day event; the end may not precede the start.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::constants::tools::CREATE_EVENT;
use crate::errors::AppResult;
use crate::models::{EventRecord, ToolResult};
use crate::tools::context::ToolExecutionContext;
use crate::tools::traits::{AgentTool, ToolCapabilities};
use crate::workspace::NewEvent;

use super::{
    batch_items, clean_tags, item_failure, optional_text, parse_args, required_text,
    resolve_project, BatchOutcome,
};

/// Minimal projection returned to the model
pub(super) fn event_summary(event: &EventRecord, ctx: &ToolExecutionContext) -> Value {
    json!({
        "id": event.id,
        "title": event.title,
        "starts_at": ctx.local(event.starts_at),
        "ends_at": event.ends_at.map(|d| ctx.local(d)),
        "all_day": event.all_day,
        "location": event.location,
        "project_id": event.project_id,
    })
}

#[derive(Debug, Deserialize)]
struct EventItem {
    title: String,
    #[serde(alias = "start", alias = "start_time")]
    starts_at: String,
    #[serde(alias = "end", alias = "end_time")]
    ends_at: Option<String>,
    all_day: Option<bool>,
    location: Option<String>,
    description: Option<String>,
    project: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Creates one or more calendar events; each item succeeds or fails on its own
pub struct CreateEventTool;

impl CreateEventTool {
    async fn create_one(ctx: &ToolExecutionContext, item: Value) -> Result<Value, ToolResult> {
        let item: EventItem = parse_args(CREATE_EVENT, item).map_err(item_failure)?;
        let title = required_text(CREATE_EVENT, "title", &item.title).map_err(item_failure)?;

        let start = ctx.parse_date(&item.starts_at).map_err(item_failure)?;
        let all_day = item.all_day.unwrap_or_else(|| start.is_date_only());
        let starts_at = start.start(ctx.timezone).map_err(item_failure)?;
        let ends_at = item
            .ends_at
            .as_deref()
            .map(|raw| ctx.parse_date(raw)?.end(ctx.timezone))
            .transpose()
            .map_err(item_failure)?;
        if ends_at.is_some_and(|end| end < starts_at) {
            return Err(ToolResult::failure("ends_at must not be before starts_at"));
        }

        let project_id = resolve_project(ctx, item.project.as_deref())
            .await
            .map_err(item_failure)??;

        let new_event = NewEvent {
            title,
            description: optional_text(item.description),
            location: optional_text(item.location),
            starts_at,
            ends_at,
            all_day,
            project_id,
            tags: clean_tags(item.tags),
        };
        let event = ctx
            .store
            .create_event(ctx.owner_id, &new_event)
            .await
            .map_err(item_failure)?;
        Ok(event_summary(&event, ctx))
    }
}

#[async_trait]
impl AgentTool for CreateEventTool {
    fn name(&self) -> &'static str {
        CREATE_EVENT
    }

    fn description(&self) -> &'static str {
        "Create one or more calendar events. Pass every event in the `events` array. \
         A start given as a bare date (YYYY-MM-DD) creates an all-day event."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "events": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string"},
                            "starts_at": {
                                "type": "string",
                                "description": "Local YYYY-MM-DDTHH:MM, or YYYY-MM-DD for all-day"
                            },
                            "ends_at": {"type": "string", "description": "Local end, same formats"},
                            "all_day": {"type": "boolean"},
                            "location": {"type": "string"},
                            "description": {"type": "string"},
                            "project": {"type": "string", "description": "Project name or id"},
                            "tags": {"type": "array", "items": {"type": "string"}}
                        },
                        "required": ["title", "starts_at"]
                    }
                }
            },
            "required": ["events"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::WRITES_DATA
    }

    async fn execute(&self, args: Value, ctx: &ToolExecutionContext) -> AppResult<ToolResult> {
        let items = batch_items(CREATE_EVENT, "events", args)?;
        let mut outcome = BatchOutcome::new("events");
        for (index, item) in items.into_iter().enumerate() {
            let result = Self::create_one(ctx, item.clone()).await;
            outcome.record(index, &item, result);
        }
        Ok(outcome.finish())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;

    use chrono_tz::Europe;
    use uuid::Uuid;

    use super::*;
    use crate::database::Database;

    #[tokio::test]
    async fn test_all_day_and_inverted_range() {
        let db = Database::in_memory().await.unwrap();
        let ctx = ToolExecutionContext::new(Uuid::new_v4(), Europe::Rome, Arc::new(db.workspace()));
        let args = json!({"events": [
            {"title": "Holiday", "starts_at": "2026-12-25"},
            {"title": "Backwards", "starts_at": "2026-10-20T10:00", "ends_at": "2026-10-20T09:00"}
        ]});

        let result = CreateEventTool.execute(args, &ctx).await.unwrap();
        assert!(!result.success);
        let data = result.data.unwrap();
        assert_eq!(data["created"], 1);
        assert_eq!(data["events"][0]["all_day"], true);
        assert_eq!(data["events"][0]["starts_at"], "2026-12-25T00:00:00+01:00");
        assert_eq!(data["errors"][0]["title"], "Backwards");
    }
}
