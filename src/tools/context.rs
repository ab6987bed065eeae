// ABOUTME: Defines ToolExecutionContext which gives tools the caller, clock, and store.
// ABOUTME: One context is built per turn and shared by every tool call in it.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::utils::time::{format_local, UserDateTime};
use crate::workspace::WorkspaceStore;

use super::resolver::EntityResolver;

/// Everything a tool needs to act on the caller's behalf
#[derive(Clone)]
pub struct ToolExecutionContext {
    /// Caller; every store call is scoped by it
    pub owner_id: Uuid,
    /// Timezone used to read local dates in arguments
    pub timezone: Tz,
    /// Clock reading taken at turn start
    pub now: DateTime<Utc>,
    /// Domain collaborator
    pub store: Arc<dyn WorkspaceStore>,
}

impl ToolExecutionContext {
    /// Create a new execution context
    #[must_use]
    pub fn new(owner_id: Uuid, timezone: Tz, store: Arc<dyn WorkspaceStore>) -> Self {
        Self {
            owner_id,
            timezone,
            now: Utc::now(),
            store,
        }
    }

    /// Override the clock reading
    #[must_use]
    pub const fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Resolver bound to this caller
    #[must_use]
    pub fn resolver(&self) -> EntityResolver<'_> {
        EntityResolver::new(self.store.as_ref(), self.owner_id)
    }

    /// Parse a date argument in the caller's timezone
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a recognized date format.
    pub fn parse_date(&self, raw: &str) -> AppResult<UserDateTime> {
        UserDateTime::parse(raw, self.timezone)
    }

    /// Render an instant for tool output
    #[must_use]
    pub fn local(&self, at: DateTime<Utc>) -> String {
        format_local(at, self.timezone)
    }
}

impl fmt::Debug for ToolExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolExecutionContext")
            .field("owner_id", &self.owner_id)
            .field("timezone", &self.timezone)
            .field("now", &self.now)
            .field("store", &"<WorkspaceStore>")
            .finish()
    }
}
