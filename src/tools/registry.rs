// ABOUTME: Central registry for assistant tools with the fail-closed dispatch boundary.
// ABOUTME: Builds the tool catalog for the model and turns every outcome into a ToolResult.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # Tool Registry
//!
//! Built once at startup and shared immutably. [`ToolRegistry::dispatch`] is
//! the only entry point the orchestrator uses: it never returns an error.
//! Unknown names, undecodable arguments, handler errors, and handler panics
//! all come back as `{success: false, error}` so a single bad call cannot
//! abort the turn.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::errors::ToolError;
use crate::llm::ToolDefinition;
use crate::models::ToolResult;

use super::context::ToolExecutionContext;
use super::implementations::{
    CreateEventTool, CreateNoteTool, CreateProjectTool, CreateTaskTool, DeleteEntityTool,
    GetStatisticsTool, QueryEntitiesTool, SearchEntitiesTool, UpdateTaskTool,
};
use super::traits::AgentTool;

/// Central registry for assistant tools
pub struct ToolRegistry {
    /// Registered tools by name
    tools: HashMap<String, Arc<dyn AgentTool>>,
    /// Registration order, used for a stable catalog
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registry holding the full built-in catalog
    #[must_use]
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_tools();
        registry
    }

    /// Register a tool in the registry
    ///
    /// # Returns
    ///
    /// `true` if the tool was registered, `false` if a tool with the same name exists
    pub fn register(&mut self, tool: Arc<dyn AgentTool>) -> bool {
        let name = tool.name().to_owned();

        if self.tools.contains_key(&name) {
            warn!(
                "{}, skipping",
                ToolError::already_registered(name.as_str())
            );
            return false;
        }

        debug!(
            "Registering tool '{}' with capabilities: {}",
            name,
            tool.capabilities().describe()
        );
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        true
    }

    /// Register every built-in tool
    pub fn register_builtin_tools(&mut self) {
        let builtin: [Arc<dyn AgentTool>; 9] = [
            Arc::new(CreateTaskTool),
            Arc::new(CreateEventTool),
            Arc::new(CreateNoteTool),
            Arc::new(CreateProjectTool),
            Arc::new(QueryEntitiesTool),
            Arc::new(SearchEntitiesTool),
            Arc::new(UpdateTaskTool),
            Arc::new(DeleteEntityTool),
            Arc::new(GetStatisticsTool),
        ];
        for tool in builtin {
            self.register(tool);
        }
        info!("Registered {} built-in tools", self.len());
    }

    /// Get a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn AgentTool>> {
        self.tools.get(name)
    }

    /// Check if a tool is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get the number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names in registration order
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Catalog sent with every model request, in registration order
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolDefinition {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.input_schema(),
            })
            .collect()
    }

    /// Run the tool the model asked for, with its raw JSON argument string.
    ///
    /// Never fails: every failure mode is folded into the returned result.
    pub async fn dispatch(
        &self,
        name: &str,
        raw_arguments: &str,
        context: &ToolExecutionContext,
    ) -> ToolResult {
        let Some(tool) = self.get(name) else {
            warn!(tool = name, "Model requested an unknown tool");
            return ToolResult::failure(ToolError::not_found(name).to_string());
        };

        let args = match parse_arguments(raw_arguments) {
            Ok(args) => args,
            Err(e) => {
                let error = ToolError::invalid_parameter(name, "arguments", e.to_string());
                warn!(tool = name, error = %error, "Tool arguments are not valid JSON");
                return ToolResult::failure(error.to_string());
            }
        };

        let started = Instant::now();
        let outcome = AssertUnwindSafe(tool.execute(args, context))
            .catch_unwind()
            .await;
        let elapsed_ms = started.elapsed().as_millis();

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(tool = name, code = ?e.code, error = %e.message, "Tool execution failed");
                ToolResult::failure(e.message)
            }
            Err(panic) => {
                let details = panic_message(panic.as_ref());
                warn!(tool = name, panic = %details, "Tool panicked");
                ToolResult::failure(
                    ToolError::execution_failed(name, "internal error while running the tool")
                        .to_string(),
                )
            }
        };

        info!(
            tool = name,
            user_id = %context.owner_id,
            writes_data = tool.capabilities().writes_data(),
            success = result.success,
            elapsed_ms,
            "Tool call finished"
        );
        result
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

/// Blank arguments are read as an empty object
fn parse_arguments(raw: &str) -> Result<Value, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(raw)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use async_trait::async_trait;
    use chrono_tz::Tz;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::database::Database;
    use crate::errors::{AppError, AppResult};
    use crate::tools::traits::ToolCapabilities;

    struct PanickingTool;

    #[async_trait]
    impl AgentTool for PanickingTool {
        fn name(&self) -> &'static str {
            "explode"
        }

        fn description(&self) -> &'static str {
            "Always panics"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }

        fn capabilities(&self) -> ToolCapabilities {
            ToolCapabilities::READS_DATA
        }

        async fn execute(&self, _args: Value, _ctx: &ToolExecutionContext) -> AppResult<ToolResult> {
            panic!("boom");
        }
    }

    struct FailingTool;

    #[async_trait]
    impl AgentTool for FailingTool {
        fn name(&self) -> &'static str {
            "fail"
        }

        fn description(&self) -> &'static str {
            "Always errors"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }

        fn capabilities(&self) -> ToolCapabilities {
            ToolCapabilities::READS_DATA
        }

        async fn execute(&self, _args: Value, _ctx: &ToolExecutionContext) -> AppResult<ToolResult> {
            Err(AppError::invalid_input("title must not be empty"))
        }
    }

    async fn context() -> ToolExecutionContext {
        let db = Database::in_memory().await.unwrap();
        ToolExecutionContext::new(Uuid::new_v4(), Tz::UTC, Arc::new(db.workspace()))
    }

    #[test]
    fn test_builtin_catalog_names() {
        let registry = ToolRegistry::with_builtin_tools();
        assert_eq!(
            registry.tool_names(),
            vec![
                "create_task",
                "create_event",
                "create_note",
                "create_project",
                "query_entities",
                "search_entities",
                "update_task",
                "delete_entity",
                "get_statistics",
            ]
        );
        for definition in registry.definitions() {
            assert_eq!(definition.parameters["type"], "object", "{}", definition.name);
        }
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = ToolRegistry::new();
        assert!(registry.register(Arc::new(FailingTool)));
        assert!(!registry.register(Arc::new(FailingTool)));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_fails_closed() {
        let registry = ToolRegistry::with_builtin_tools();
        let result = registry.dispatch("drop_database", "{}", &context().await).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("unknown tool: drop_database"));
    }

    #[tokio::test]
    async fn test_invalid_json_arguments_fail_the_call() {
        let registry = ToolRegistry::with_builtin_tools();
        let result = registry
            .dispatch("create_note", "{\"title\": ", &context().await)
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("arguments"));
    }

    #[tokio::test]
    async fn test_errors_and_panics_become_failed_results() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FailingTool));
        registry.register(Arc::new(PanickingTool));
        let ctx = context().await;

        let failed = registry.dispatch("fail", "{}", &ctx).await;
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("title must not be empty"));

        let panicked = registry.dispatch("explode", "", &ctx).await;
        assert!(!panicked.success);
        assert!(panicked.error.unwrap().contains("explode"));
    }
}
