// ABOUTME: Tool layer exposing workspace operations to the model
// ABOUTME: Tool trait, execution context, reference resolver, registry, and the built-in tools
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # Tools
//!
//! Every operation the model may request is an [`AgentTool`] registered by
//! name in the [`ToolRegistry`]. The registry is the only entry point: it
//! fails closed on unknown names and turns every handler error or panic into
//! a failed [`ToolResult`](crate::models::ToolResult), so a bad tool call
//! never aborts the turn.
//!
//! Handlers that take a human-readable reference go through the
//! [`EntityResolver`]; they never guess between several matches.

/// Per-call execution context
pub mod context;
/// Built-in tool implementations
pub mod implementations;
/// Name-to-handler registry and dispatch
pub mod registry;
/// Human-readable reference resolution
pub mod resolver;
/// Tool trait and capability flags
pub mod traits;

pub use context::ToolExecutionContext;
pub use registry::ToolRegistry;
pub use resolver::{EntityResolver, Resolution};
pub use traits::{AgentTool, ToolCapabilities};
