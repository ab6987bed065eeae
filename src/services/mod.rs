// ABOUTME: Domain service layer between the HTTP routes and the stores
// ABOUTME: Turn orchestration and workspace statistics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! Domain service layer
//!
//! Services hold the business rules of the assistant. Routes only
//! authenticate, decode, and encode; everything else happens here so the
//! library API and the HTTP surface behave the same.

/// Assistant turns and conversation lifecycle
pub mod chat_orchestration;

/// Named workspace metrics and the prompt snapshot
pub mod statistics;

pub use chat_orchestration::{conversation_title, ChatOrchestrator, TurnOutcome};
pub use statistics::{Metric, StatisticsService, WorkspaceSnapshot};
