// ABOUTME: System instruction assembly for every assistant turn
// ABOUTME: Combines the static prompt with identity, workspace snapshot, and local time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # System Prompts
//!
//! The static part of the instruction is loaded at compile time from a
//! markdown file. [`PromptBuilder::build`] appends the per-turn context: who
//! the user is, a snapshot of their workspace, and the current date and time
//! in their timezone.

use std::fmt::Write;

use chrono::{DateTime, Datelike, Duration, Offset};
use chrono_tz::Tz;

use crate::auth::UserIdentity;
use crate::services::statistics::WorkspaceSnapshot;

/// Static assistant instructions
pub const ASSISTANT_SYSTEM_PROMPT: &str = include_str!("assistant_system.md");

/// Everything a single turn's system instruction depends on
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    /// Authenticated caller
    pub user: &'a UserIdentity,
    /// Live counts from the user's workspace
    pub snapshot: &'a WorkspaceSnapshot,
    /// Point-in-time clock reading in the user's timezone
    pub now: DateTime<Tz>,
}

/// Builds the system instruction placed first in every model request
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    base: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(ASSISTANT_SYSTEM_PROMPT)
    }
}

impl PromptBuilder {
    /// Builder with a custom static prompt
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// Compose the instruction for one turn
    #[must_use]
    pub fn build(&self, context: &PromptContext<'_>) -> String {
        let mut prompt = String::with_capacity(self.base.len() + 768);
        prompt.push_str(self.base.trim_end());
        prompt.push_str("\n\n");

        Self::write_identity(&mut prompt, context);
        Self::write_clock(&mut prompt, context.now);
        Self::write_snapshot(&mut prompt, context.snapshot);

        prompt
    }

    fn write_identity(prompt: &mut String, context: &PromptContext<'_>) {
        let user = context.user;
        prompt.push_str("# User\n");
        if let Some(name) = user.display_name.as_deref().filter(|n| !n.is_empty()) {
            let _ = writeln!(prompt, "- Name: {name}");
        }
        let _ = writeln!(prompt, "- Locale: {}", user.locale_or_default());
        let _ = writeln!(prompt, "- Timezone: {}", context.now.timezone().name());
        prompt.push('\n');
    }

    fn write_clock(prompt: &mut String, now: DateTime<Tz>) {
        let tomorrow = now + Duration::days(1);
        prompt.push_str("# Current date and time\n");
        let _ = writeln!(
            prompt,
            "- Now: {} {} (UTC{}, ISO week {})",
            now.format("%A %Y-%m-%d"),
            now.format("%H:%M"),
            now.offset().fix(),
            now.iso_week().week()
        );
        let _ = writeln!(prompt, "- Tomorrow: {}", tomorrow.format("%A %Y-%m-%d"));
        prompt.push('\n');
    }

    fn write_snapshot(prompt: &mut String, snapshot: &WorkspaceSnapshot) {
        prompt.push_str("# Workspace snapshot\n");
        let _ = writeln!(prompt, "- Open tasks: {}", snapshot.open_tasks);
        let _ = writeln!(prompt, "- Overdue tasks: {}", snapshot.overdue_tasks);
        let _ = writeln!(prompt, "- Tasks due today: {}", snapshot.due_today);
        let _ = writeln!(prompt, "- Tasks completed today: {}", snapshot.completed_today);
        let _ = writeln!(
            prompt,
            "- Events in the next 7 days: {}",
            snapshot.upcoming_events
        );
        let _ = writeln!(prompt, "- Projects: {}", snapshot.projects);
    }
}
