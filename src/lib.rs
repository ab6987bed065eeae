// ABOUTME: Main library entry point for the Agenda Assistant
// ABOUTME: Conversational agent that turns chat messages into task, event, note, and project operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

#![deny(unsafe_code)]

//! # Agenda Assistant
//!
//! A conversational assistant for a personal productivity suite. A user
//! message goes to a chat-completion model together with a catalog of tools;
//! the tools the model asks for are executed against the user's tasks,
//! events, notes, and projects; the results go back to the model; and the
//! finished exchange is stored with its token usage.
//!
//! ## Architecture
//!
//! - **services**: `ChatOrchestrator` runs one turn end to end
//! - **llm**: `LlmProvider` contract and the OpenAI-compatible client
//! - **tools**: tool trait, registry with fail-closed dispatch, reference resolver
//! - **workspace**: owner-scoped store contract for the productivity data
//! - **database**: SQLite conversation store, usage ledger, and workspace store
//! - **routes**: axum HTTP surface
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use agenda_assistant::auth::UserIdentity;
//! use agenda_assistant::config::AssistantConfig;
//! use agenda_assistant::database::Database;
//! use agenda_assistant::errors::AppResult;
//! use agenda_assistant::llm::OpenAiCompatibleProvider;
//! use agenda_assistant::services::ChatOrchestrator;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = AssistantConfig::from_env()?;
//!     let provider = OpenAiCompatibleProvider::new(config.provider_config())?;
//!     let database = Database::new("sqlite://agenda.db?mode=rwc").await?;
//!     let orchestrator = ChatOrchestrator::new(Arc::new(provider), &database, config)?;
//!
//!     let user = UserIdentity::new(Uuid::new_v4());
//!     let outcome = orchestrator
//!         .send_message(&user, "Remind me to call Mario tomorrow at 3pm", None)
//!         .await?;
//!     println!("{}", outcome.response);
//!     Ok(())
//! }
//! ```

/// Bearer token validation and caller identity
pub mod auth;

/// Environment configuration
pub mod config;

/// Limits and tool names
pub mod constants;

/// SQLite persistence
pub mod database;

/// Unified error handling
pub mod errors;

/// Chat-completion provider abstraction and prompts
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Shared data models
pub mod models;

/// Shared server resources
pub mod resources;

/// HTTP routes
pub mod routes;

/// Turn orchestration and statistics
pub mod services;

/// Tools the model can call
pub mod tools;

/// Time and identifier helpers
pub mod utils;

/// Productivity data store contract
pub mod workspace;
