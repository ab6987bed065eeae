// ABOUTME: Core types and constants for the Agenda Assistant
// ABOUTME: Foundation crate with error handling, domain models, and limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

#![deny(unsafe_code)]

//! # Agenda Core
//!
//! Foundation crate providing shared types for the Agenda Assistant. It holds
//! everything the orchestrator, the tool layer, and the HTTP routes agree on,
//! and is expected to change rarely.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `ToolError`
//! - **constants**: Limits and identifiers shared across the workspace
//! - **models**: Conversation, message, usage, and workspace entity records

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants (limits, tool names)
pub mod constants;

/// Core data models (conversations, messages, tasks, events, notes, projects)
pub mod models;
