// ABOUTME: Project tool: create_project.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::constants::tools::CREATE_PROJECT;
use crate::errors::AppResult;
use crate::models::{ProjectRecord, ToolResult};
use crate::tools::context::ToolExecutionContext;
use crate::tools::traits::{AgentTool, ToolCapabilities};
use crate::workspace::NewProject;

use super::{optional_text, parse_args, required_text};

pub(super) fn project_summary(project: &ProjectRecord) -> Value {
    json!({
        "id": project.id,
        "name": project.name,
        "description": project.description,
    })
}

#[derive(Debug, Deserialize)]
struct CreateProjectInput {
    #[serde(alias = "title")]
    name: String,
    description: Option<String>,
}

/// Creates a project
pub struct CreateProjectTool;

#[async_trait]
impl AgentTool for CreateProjectTool {
    fn name(&self) -> &'static str {
        CREATE_PROJECT
    }

    fn description(&self) -> &'static str {
        "Create a project that tasks, events, and notes can belong to."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "description": {"type": "string"}
            },
            "required": ["name"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::WRITES_DATA
    }

    async fn execute(&self, args: Value, ctx: &ToolExecutionContext) -> AppResult<ToolResult> {
        let input: CreateProjectInput = parse_args(CREATE_PROJECT, args)?;
        let project = NewProject {
            name: required_text(CREATE_PROJECT, "name", &input.name)?,
            description: optional_text(input.description),
        };

        let project = ctx.store.create_project(ctx.owner_id, &project).await?;
        Ok(ToolResult::ok(json!({ "project": project_summary(&project) })))
    }
}
