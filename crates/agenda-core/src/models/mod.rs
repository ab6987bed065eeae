// ABOUTME: Core data models shared across the workspace
// ABOUTME: Conversation records, tool results, and workspace entities
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! Core data models
//!
//! Records exchanged between the conversation store, the tool layer, and the
//! HTTP routes. Identifiers are UUIDs; timestamps are UTC.

/// Conversation, message, and usage records
pub mod conversation;
/// Tool result and tool usage records
pub mod tool;
/// Tasks, events, notes, and projects
pub mod workspace;

pub use conversation::{
    Conversation, ConversationRecord, ConversationSummary, MessageRecord, StoredRole,
    UsageRecord, UsageSummary,
};
pub use tool::{ToolResult, ToolUsage};
pub use workspace::{
    EntityCandidate, EntityKind, EventRecord, NoteRecord, ProjectRecord, TaskPriority,
    TaskRecord, TaskStatus,
};
