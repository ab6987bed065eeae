// ABOUTME: Failures raised while looking up, decoding, or running an assistant tool
// ABOUTME: Each variant names the tool so the model sees which call went wrong
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use thiserror::Error;

/// Registry and argument failures for one tool call.
///
/// Converted into [`super::AppError`] (and from there into a failed tool
/// result) by the registry; never surfaces to the HTTP caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// The model asked for a name the registry does not hold
    #[error("unknown tool: {tool}")]
    NotFound {
        /// Requested name
        tool: String,
    },
    /// An argument is present but unusable
    #[error("Invalid parameter '{parameter}' for tool '{tool}': {reason}")]
    InvalidParameter {
        /// Tool being called
        tool: String,
        /// Offending argument
        parameter: String,
        /// What was wrong with it
        reason: String,
    },
    /// A required argument is absent or blank
    #[error("Missing required parameter '{parameter}' for tool '{tool}'")]
    MissingParameter {
        /// Tool being called
        tool: String,
        /// Absent argument
        parameter: String,
    },
    /// The handler gave up (or panicked)
    #[error("Tool '{tool}' execution failed: {details}")]
    ExecutionFailed {
        /// Tool being called
        tool: String,
        /// Cause, safe to show the model
        details: String,
    },
    /// A second tool claimed an existing name at startup
    #[error("Tool '{tool}' is already registered")]
    AlreadyRegistered {
        /// Duplicated name
        tool: String,
    },
}

impl ToolError {
    /// Unknown tool name
    #[must_use]
    pub fn not_found(tool: impl Into<String>) -> Self {
        Self::NotFound { tool: tool.into() }
    }

    /// Argument present but invalid
    #[must_use]
    pub fn invalid_parameter(
        tool: impl Into<String>,
        parameter: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            tool: tool.into(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Argument missing
    #[must_use]
    pub fn missing_parameter(tool: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            tool: tool.into(),
            parameter: parameter.into(),
        }
    }

    /// Handler failure
    #[must_use]
    pub fn execution_failed(tool: impl Into<String>, details: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool: tool.into(),
            details: details.into(),
        }
    }

    /// Duplicate registration
    #[must_use]
    pub fn already_registered(tool: impl Into<String>) -> Self {
        Self::AlreadyRegistered { tool: tool.into() }
    }

    /// Name of the tool involved
    #[must_use]
    pub fn tool_name(&self) -> &str {
        match self {
            Self::NotFound { tool }
            | Self::InvalidParameter { tool, .. }
            | Self::MissingParameter { tool, .. }
            | Self::ExecutionFailed { tool, .. }
            | Self::AlreadyRegistered { tool } => tool,
        }
    }
}
