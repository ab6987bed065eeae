// ABOUTME: Configuration module for server and assistant settings
// ABOUTME: Environment-only loading with typed parsing helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! Configuration for the Agenda Assistant
//!
//! - **environment**: HTTP, database, and token settings (`ServerConfig`)
//! - **assistant**: Model endpoint, sampling, history window, retry policy (`AssistantConfig`)
//!
//! Configuration is read from environment variables only. Values are parsed
//! once at startup and passed explicitly to the components that need them.

/// Model and turn-processing configuration
pub mod assistant;
/// Server configuration from environment variables
pub mod environment;

pub use assistant::{AssistantConfig, RetryPolicy};
pub use environment::{AuthConfig, ServerConfig};

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::errors::{AppError, AppResult, ErrorCode};

/// Read `key`, falling back to `default` when unset or empty
#[must_use]
pub fn env_var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_owned())
}

/// Read `key` if it is set to a non-empty value
#[must_use]
pub fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read a required variable
///
/// # Errors
///
/// Returns `ConfigMissing` when the variable is unset or empty.
pub fn required_env(key: &str) -> AppResult<String> {
    optional_env(key).ok_or_else(|| {
        AppError::new(
            ErrorCode::ConfigMissing,
            format!("Environment variable {key} is required"),
        )
    })
}

/// Parse `key` into `T`, using `default` when unset
///
/// # Errors
///
/// Returns `ConfigInvalid` when the value does not parse.
pub fn parse_env<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    optional_env(key).map_or(Ok(default), |raw| {
        raw.trim().parse::<T>().map_err(|e| {
            AppError::new(
                ErrorCode::ConfigInvalid,
                format!("Invalid {key} value '{raw}': {e}"),
            )
        })
    })
}

/// Parse an optional `key` into `T`
///
/// # Errors
///
/// Returns `ConfigInvalid` when the value is set but does not parse.
pub fn parse_optional_env<T>(key: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    optional_env(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                AppError::new(
                    ErrorCode::ConfigInvalid,
                    format!("Invalid {key} value '{raw}': {e}"),
                )
            })
        })
        .transpose()
}
