// ABOUTME: Assistant configuration passed explicitly into the orchestrator
// ABOUTME: Model endpoint, credentials, sampling, history window, and retry policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use std::time::Duration;

use chrono_tz::Tz;

use super::{env_var_or, optional_env, parse_env, parse_optional_env, required_env};
use crate::constants::limits::DEFAULT_HISTORY_LIMIT;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::llm::OpenAiCompatibleConfig;

/// Default chat completions endpoint
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Longest delay between two attempts
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Bounded exponential backoff applied to retryable model failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure (0 disables retries)
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each subsequent one
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }
}

/// Everything the orchestrator needs to talk to the model
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Chat completions base URL
    pub base_url: String,
    /// Bearer credential
    pub api_key: Option<String>,
    /// Model identifier sent with every request
    pub model: String,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Completion token cap
    pub max_tokens: Option<u32>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Persisted messages replayed to the model
    pub history_limit: usize,
    /// Retry policy for model calls
    pub retry: RetryPolicy,
    /// Timezone used when the caller's token carries none or an unknown one
    pub default_timezone: Tz,
}

impl AssistantConfig {
    /// Defaults for `model`
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_owned(),
            api_key: None,
            model: model.into(),
            temperature: Some(0.3),
            max_tokens: None,
            request_timeout: Duration::from_secs(120),
            history_limit: DEFAULT_HISTORY_LIMIT,
            retry: RetryPolicy::default(),
            default_timezone: Tz::UTC,
        }
    }

    /// Load from `AGENDA_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `AGENDA_LLM_MODEL` is missing or a
    /// value does not parse.
    pub fn from_env() -> AppResult<Self> {
        let timezone_name = env_var_or("AGENDA_DEFAULT_TIMEZONE", "UTC");
        let default_timezone = timezone_name.parse::<Tz>().map_err(|e| {
            AppError::new(
                ErrorCode::ConfigInvalid,
                format!("Invalid AGENDA_DEFAULT_TIMEZONE value '{timezone_name}': {e}"),
            )
        })?;

        Ok(Self {
            base_url: env_var_or("AGENDA_LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
            api_key: optional_env("AGENDA_LLM_API_KEY"),
            model: required_env("AGENDA_LLM_MODEL")?,
            temperature: parse_optional_env("AGENDA_LLM_TEMPERATURE")?,
            max_tokens: parse_optional_env("AGENDA_LLM_MAX_TOKENS")?,
            request_timeout: Duration::from_secs(parse_env("AGENDA_LLM_TIMEOUT_SECS", 120)?),
            history_limit: parse_env("AGENDA_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)?,
            retry: RetryPolicy {
                max_retries: parse_env("AGENDA_LLM_MAX_RETRIES", 0)?,
                base_delay: Duration::from_millis(parse_env(
                    "AGENDA_LLM_RETRY_BASE_DELAY_MS",
                    500,
                )?),
            },
            default_timezone,
        })
    }

    /// Client configuration for the chat completions provider
    #[must_use]
    pub fn provider_config(&self) -> OpenAiCompatibleConfig {
        OpenAiCompatibleConfig::new(self.base_url.clone(), self.model.clone())
            .with_api_key(self.api_key.clone())
            .with_request_timeout(self.request_timeout)
    }

    /// Timezone for a caller, falling back to the configured default
    #[must_use]
    pub fn resolve_timezone(&self, name: Option<&str>) -> Tz {
        name.and_then(|n| n.parse::<Tz>().ok())
            .unwrap_or(self.default_timezone)
    }
}
