// ABOUTME: Defines the AgentTool trait and ToolCapabilities for the assistant's tool catalog.
// ABOUTME: Tools implement this trait to be registered and dispatched via the ToolRegistry.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # Agent Tool Trait and Capabilities
//!
//! Every operation the model may request is an [`AgentTool`]: a name, a
//! description written for the model, a JSON Schema of the arguments, and an
//! async `execute`. The registry turns the metadata into the catalog sent
//! with each model request.

use async_trait::async_trait;
use bitflags::bitflags;
use serde_json::Value;

use crate::errors::AppResult;
use crate::models::ToolResult;

use super::context::ToolExecutionContext;

bitflags! {
    /// Capabilities that tools declare for logging and filtering.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ToolCapabilities: u8 {
        /// Tool reads workspace data
        const READS_DATA = 0b0000_0001;
        /// Tool creates, modifies, or deletes workspace data
        const WRITES_DATA = 0b0000_0010;
        /// Tool computes aggregates
        const ANALYTICS = 0b0000_0100;
    }
}

impl ToolCapabilities {
    /// Check if tool writes data
    #[must_use]
    pub const fn writes_data(self) -> bool {
        self.contains(Self::WRITES_DATA)
    }

    /// Get a description of all enabled capabilities for logging
    #[must_use]
    pub fn describe(&self) -> String {
        let parts: Vec<&str> = [
            (Self::READS_DATA, "reads_data"),
            (Self::WRITES_DATA, "writes_data"),
            (Self::ANALYTICS, "analytics"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();

        if parts.is_empty() {
            "none".to_owned()
        } else {
            parts.join(", ")
        }
    }
}

/// A side-effecting or read-only operation the model can request.
///
/// # Example
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use agenda_assistant::errors::AppResult;
/// use agenda_assistant::models::ToolResult;
/// use agenda_assistant::tools::{AgentTool, ToolCapabilities, ToolExecutionContext};
/// use serde_json::{json, Value};
///
/// struct PingTool;
///
/// #[async_trait]
/// impl AgentTool for PingTool {
///     fn name(&self) -> &'static str {
///         "ping"
///     }
///
///     fn description(&self) -> &'static str {
///         "Answer with pong"
///     }
///
///     fn input_schema(&self) -> Value {
///         json!({"type": "object", "properties": {}})
///     }
///
///     fn capabilities(&self) -> ToolCapabilities {
///         ToolCapabilities::READS_DATA
///     }
///
///     async fn execute(&self, _args: Value, _ctx: &ToolExecutionContext) -> AppResult<ToolResult> {
///         Ok(ToolResult::ok(json!({"pong": true})))
///     }
/// }
/// ```
#[async_trait]
pub trait AgentTool: Send + Sync {
    /// Unique name the model calls the tool by
    fn name(&self) -> &'static str;

    /// Description for model consumption
    fn description(&self) -> &'static str;

    /// JSON Schema of the arguments, matching what `execute` accepts
    fn input_schema(&self) -> Value;

    /// Capability flags
    fn capabilities(&self) -> ToolCapabilities;

    /// Execute with decoded JSON arguments.
    ///
    /// Expected domain outcomes (not found, ambiguous reference, partial
    /// batch) are returned as a failed [`ToolResult`], not as `Err`.
    ///
    /// # Errors
    ///
    /// Returns `AppError` for invalid arguments or storage failures; the
    /// registry turns it into a failed result.
    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_flags() {
        let update = ToolCapabilities::READS_DATA | ToolCapabilities::WRITES_DATA;
        assert!(update.writes_data());
        assert_eq!(update.describe(), "reads_data, writes_data");

        assert!(!ToolCapabilities::ANALYTICS.writes_data());
        assert_eq!(ToolCapabilities::empty().describe(), "none");
    }
}
