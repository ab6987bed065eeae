// ABOUTME: Server configuration loaded from environment variables
// ABOUTME: HTTP binding, database URL, token validation, and assistant settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use tracing::info;

use super::{env_var_or, parse_env, required_env, AssistantConfig};
use crate::errors::{AppError, AppResult, ErrorCode};

/// Shortest accepted HS256 secret
const MIN_JWT_SECRET_BYTES: usize = 32;

/// Token validation settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared HS256 secret
    pub jwt_secret: String,
    /// Expected `aud` claim
    pub jwt_audience: String,
    /// Lifetime of tokens issued by tooling
    pub jwt_expiry_hours: i64,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// HTTP port
    pub http_port: u16,
    /// sqlx database URL
    pub database_url: String,
    /// Token validation
    pub auth: AuthConfig,
    /// Model and turn settings
    pub assistant: AssistantConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        let jwt_secret = required_env("AGENDA_JWT_SECRET")?;
        if jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(AppError::new(
                ErrorCode::ConfigInvalid,
                format!("AGENDA_JWT_SECRET must be at least {MIN_JWT_SECRET_BYTES} bytes"),
            ));
        }

        Ok(Self {
            host: env_var_or("HOST", "127.0.0.1"),
            http_port: parse_env("HTTP_PORT", 8081)?,
            database_url: env_var_or("DATABASE_URL", "sqlite://agenda.db?mode=rwc"),
            auth: AuthConfig {
                jwt_secret,
                jwt_audience: env_var_or("AGENDA_JWT_AUDIENCE", "agenda-assistant"),
                jwt_expiry_hours: parse_env("AGENDA_JWT_EXPIRY_HOURS", 24)?,
            },
            assistant: AssistantConfig::from_env()?,
        })
    }

    /// One-line description for startup logs (no secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "http={}:{} database={} model={} base_url={} history_limit={} max_retries={}",
            self.host,
            self.http_port,
            self.database_url,
            self.assistant.model,
            self.assistant.base_url,
            self.assistant.history_limit,
            self.assistant.retry.max_retries
        )
    }
}
