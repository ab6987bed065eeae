// ABOUTME: Utility modules shared by tools, statistics, and routes
// ABOUTME: Timezone-aware date handling and identifier parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

/// Local-time parsing and day/week boundaries in a user's timezone
pub mod time;
/// UUID parsing and validation utilities
pub mod uuid;
