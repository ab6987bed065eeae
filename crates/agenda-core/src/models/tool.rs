// ABOUTME: Tool result envelope returned by every tool handler
// ABOUTME: Always success/data/error shaped; also persisted as tool usage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Outcome of one tool call.
///
/// Serialized as the `content` of the `tool` message sent back to the model
/// and stored verbatim in the assistant message's tool usage list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the operation fully succeeded
    pub success: bool,
    /// Structured payload (created entities, counts, matches)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// Successful result with a payload
    #[must_use]
    pub const fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed result with only an error message
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Failed result that still carries a payload (candidates, partial batches)
    #[must_use]
    pub fn failure_with_data(error: impl Into<String>, data: Value) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(error.into()),
        }
    }

    /// JSON text sent to the model as the tool message content
    #[must_use]
    pub fn to_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            json!({ "success": false, "error": format!("unserializable tool result: {e}") })
                .to_string()
        })
    }
}

/// Tool name plus its result, attached to an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUsage {
    /// Tool name as requested by the model
    pub name: String,
    /// What the tool returned
    pub result: ToolResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_omits_data() {
        let content = ToolResult::failure("unknown tool: nope").to_content();
        assert_eq!(content, r#"{"success":false,"error":"unknown tool: nope"}"#);
    }

    #[test]
    fn test_ok_omits_error() {
        let content = ToolResult::ok(json!({"created": 1})).to_content();
        assert_eq!(content, r#"{"success":true,"data":{"created":1}}"#);
    }
}
