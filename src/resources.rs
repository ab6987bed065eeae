// ABOUTME: Shared resource container handed to every HTTP handler
// ABOUTME: Database, token validation, orchestrator, and configuration built once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # Server Resources
//!
//! Expensive objects (pool, HTTP client, tool registry) are created once and
//! shared behind `Arc` instead of being rebuilt per request.

use std::sync::Arc;

use crate::auth::{AuthManager, UserIdentity};
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::AppResult;
use crate::llm::{LlmProvider, OpenAiCompatibleProvider};
use crate::services::ChatOrchestrator;

/// Resources shared by the HTTP routes
#[derive(Clone)]
pub struct ServerResources {
    /// Storage
    pub database: Arc<Database>,
    /// Bearer token validation
    pub auth_manager: Arc<AuthManager>,
    /// Turn processing
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Configuration the server was started with
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Assemble resources around an already chosen model provider
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider cannot call tools.
    pub fn new(
        database: Database,
        provider: Arc<dyn LlmProvider>,
        config: ServerConfig,
    ) -> AppResult<Self> {
        let auth_manager = AuthManager::new(
            config.auth.jwt_secret.as_bytes(),
            config.auth.jwt_audience.as_str(),
            config.auth.jwt_expiry_hours,
        );
        let orchestrator = ChatOrchestrator::new(provider, &database, config.assistant.clone())?;

        Ok(Self {
            database: Arc::new(database),
            auth_manager: Arc::new(auth_manager),
            orchestrator: Arc::new(orchestrator),
            config: Arc::new(config),
        })
    }

    /// Connect the database and the OpenAI-compatible provider from `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated, or the
    /// HTTP client cannot be built or lacks tool calling.
    pub async fn from_config(config: ServerConfig) -> AppResult<Self> {
        let database = Database::new(&config.database_url).await?;
        let provider = OpenAiCompatibleProvider::new(config.assistant.provider_config())?;
        Self::new(database, Arc::new(provider), config)
    }

    /// Validate the `Authorization` header value
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired`, `AuthInvalid`, or `AuthExpired`.
    pub fn authenticate(&self, authorization: Option<&str>) -> AppResult<UserIdentity> {
        self.auth_manager.authenticate(authorization)
    }
}
