// ABOUTME: Note tool: create_note with optional project and tags.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::constants::tools::CREATE_NOTE;
use crate::errors::AppResult;
use crate::models::{NoteRecord, ToolResult};
use crate::tools::context::ToolExecutionContext;
use crate::tools::traits::{AgentTool, ToolCapabilities};
use crate::workspace::NewNote;

use super::{clean_tags, parse_args, required_text, resolve_project};

pub(super) fn note_summary(note: &NoteRecord, ctx: &ToolExecutionContext) -> Value {
    json!({
        "id": note.id,
        "title": note.title,
        "project_id": note.project_id,
        "tags": note.tags,
        "updated_at": ctx.local(note.updated_at),
    })
}

#[derive(Debug, Deserialize)]
struct CreateNoteInput {
    title: String,
    #[serde(default, alias = "body")]
    content: String,
    project: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Creates a note
pub struct CreateNoteTool;

#[async_trait]
impl AgentTool for CreateNoteTool {
    fn name(&self) -> &'static str {
        CREATE_NOTE
    }

    fn description(&self) -> &'static str {
        "Create a note with a title and free text content, optionally inside a project."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "content": {"type": "string", "description": "Note body"},
                "project": {"type": "string", "description": "Project name or id"},
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["title"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::WRITES_DATA
    }

    async fn execute(&self, args: Value, ctx: &ToolExecutionContext) -> AppResult<ToolResult> {
        let input: CreateNoteInput = parse_args(CREATE_NOTE, args)?;
        let title = required_text(CREATE_NOTE, "title", &input.title)?;
        let project_id = match resolve_project(ctx, input.project.as_deref()).await? {
            Ok(project_id) => project_id,
            Err(failed) => return Ok(failed),
        };

        let note = ctx
            .store
            .create_note(
                ctx.owner_id,
                &NewNote {
                    title,
                    content: input.content.trim().to_owned(),
                    project_id,
                    tags: clean_tags(input.tags),
                },
            )
            .await?;

        Ok(ToolResult::ok(json!({ "note": note_summary(&note, ctx) })))
    }
}
