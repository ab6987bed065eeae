// ABOUTME: Data models re-exported from agenda-core
// ABOUTME: Conversations, messages, usage, tool results, and workspace entities
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # Data Models
//!
//! Records shared by the conversation store, the tool layer, and the routes.

pub use agenda_core::models::*;
