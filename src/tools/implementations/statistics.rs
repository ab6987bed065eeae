// ABOUTME: get_statistics tool: named workspace metrics computed in the user's timezone.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::constants::tools::GET_STATISTICS;
use crate::errors::AppResult;
use crate::models::ToolResult;
use crate::services::statistics::{Metric, StatisticsService};
use crate::tools::context::ToolExecutionContext;
use crate::tools::traits::{AgentTool, ToolCapabilities};

use super::{parse_args, resolve_project};

#[derive(Debug, Deserialize)]
struct StatisticsInput {
    #[serde(default = "default_metric")]
    metric: String,
    project: Option<String>,
}

fn default_metric() -> String {
    Metric::Overview.as_str().to_owned()
}

/// Computes one named metric
pub struct GetStatisticsTool;

#[async_trait]
impl AgentTool for GetStatisticsTool {
    fn name(&self) -> &'static str {
        GET_STATISTICS
    }

    fn description(&self) -> &'static str {
        "Compute a statistic about the user's workspace. `project_progress` needs `project`. \
         Days and weeks follow the user's timezone; weeks start on Monday."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "metric": {
                    "type": "string",
                    "enum": Metric::ALL.map(Metric::as_str)
                },
                "project": {"type": "string", "description": "Project name or id"}
            },
            "required": ["metric"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA | ToolCapabilities::ANALYTICS
    }

    async fn execute(&self, args: Value, ctx: &ToolExecutionContext) -> AppResult<ToolResult> {
        let input: StatisticsInput = parse_args(GET_STATISTICS, args)?;
        let metric: Metric = input.metric.parse()?;
        let project_id = match resolve_project(ctx, input.project.as_deref()).await? {
            Ok(project_id) => project_id,
            Err(failed) => return Ok(failed),
        };

        let service =
            StatisticsService::new(ctx.store.as_ref(), ctx.owner_id, ctx.timezone, ctx.now);
        let value = service.compute(metric, project_id).await?;
        Ok(ToolResult::ok(json!({
            "metric": metric.as_str(),
            "value": value,
        })))
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
    async fn test_unknown_metric_lists_catalog() {
        let db = Database::in_memory().await.unwrap();
        let ctx = ToolExecutionContext::new(Uuid::new_v4(), Europe::Rome, Arc::new(db.workspace()));
        let err = GetStatisticsTool
            .execute(json!({"metric": "happiness"}), &ctx)
            .await
            .unwrap_err();
        assert!(err.message.contains("Available metrics"));
    }

    #[tokio::test]
    async fn test_overview_on_empty_workspace() {
        let db = Database::in_memory().await.unwrap();
        let ctx = ToolExecutionContext::new(Uuid::new_v4(), Europe::Rome, Arc::new(db.workspace()));
        let result = GetStatisticsTool
            .execute(json!({"metric": "overview"}), &ctx)
            .await
            .unwrap();
        let data = result.data.unwrap();
        assert_eq!(data["metric"], "overview");
        assert_eq!(data["value"]["open_tasks"], 0);
    }
}
