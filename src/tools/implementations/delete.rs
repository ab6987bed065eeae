// ABOUTME: delete_entity tool: removes one task, event, note, or project by id or title.
// ABOUTME: Ambiguous references delete nothing and return the candidates instead.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::constants::tools::DELETE_ENTITY;
use crate::errors::AppResult;
use crate::models::{EntityKind, ToolResult};
use crate::tools::context::ToolExecutionContext;
use crate::tools::traits::{AgentTool, ToolCapabilities};

use super::{parse_args, required_text};

#[derive(Debug, Deserialize)]
struct DeleteInput {
    #[serde(alias = "type", alias = "entity_type")]
    kind: String,
    #[serde(alias = "id", alias = "title", alias = "name")]
    reference: String,
}

/// Deletes exactly one entity
pub struct DeleteEntityTool;

#[async_trait]
impl AgentTool for DeleteEntityTool {
    fn name(&self) -> &'static str {
        DELETE_ENTITY
    }

    fn description(&self) -> &'static str {
        "Permanently delete one task, event, note, or project, found by id or by words from its \
         title. If several match, nothing is deleted and the candidates are returned in \
         `matches`; ask the user which one they mean. Deleting a project keeps its items."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "kind": {
                    "type": "string",
                    "enum": EntityKind::ALL.map(EntityKind::as_str)
                },
                "reference": {"type": "string", "description": "Id or words from the title"}
            },
            "required": ["kind", "reference"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA | ToolCapabilities::WRITES_DATA
    }

    async fn execute(&self, args: Value, ctx: &ToolExecutionContext) -> AppResult<ToolResult> {
        let input: DeleteInput = parse_args(DELETE_ENTITY, args)?;
        let kind: EntityKind = input.kind.parse()?;
        let reference = required_text(DELETE_ENTITY, "reference", &input.reference)?;

        let resolution = ctx.resolver().resolve(kind, &reference).await?;
        let id = match resolution.into_id(kind, &reference) {
            Ok(id) => id,
            Err(failed) => return Ok(failed),
        };

        let not_found = || ToolResult::failure(format!("No {kind} found matching '{reference}'"));
        let Some(title) = ctx.store.label_of(ctx.owner_id, kind, id).await? else {
            return Ok(not_found());
        };
        if !ctx.store.delete_entity(ctx.owner_id, kind, id).await? {
            return Ok(not_found());
        }

        info!(owner_id = %ctx.owner_id, %kind, entity_id = %id, "Deleted entity");
        Ok(ToolResult::ok(json!({
            "deleted": true,
            "kind": kind,
            "id": id,
            "title": title,
        })))
    }
}
