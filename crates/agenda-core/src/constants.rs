// ABOUTME: Shared limits and identifiers for the assistant
// ABOUTME: Result caps, title lengths, defaults, and the fixed tool catalog names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

/// Row and length limits
pub mod limits {
    /// Maximum candidates fetched when resolving a free-text reference
    pub const RESOLVER_SEARCH_LIMIT: u32 = 10;

    /// Hard upper bound on rows returned by listing and search tools
    pub const QUERY_MAX_ROWS: u32 = 50;

    /// Rows returned by listing and search tools when no limit is given
    pub const QUERY_DEFAULT_ROWS: u32 = 20;

    /// Characters of the first user message kept in a generated title
    pub const TITLE_MAX_CHARS: usize = 50;

    /// Conversations returned by the listing endpoint by default
    pub const CONVERSATION_LIST_DEFAULT: u32 = 20;

    /// Conversations returned by the listing endpoint at most
    pub const CONVERSATION_LIST_MAX: u32 = 100;

    /// Persisted messages replayed to the model by default
    pub const DEFAULT_HISTORY_LIMIT: usize = 30;

    /// Window used by the "upcoming events" statistic
    pub const UPCOMING_EVENTS_DAYS: i64 = 7;

    /// Longest user message accepted for a turn
    pub const MAX_USER_MESSAGE_CHARS: usize = 8000;
}

/// Names of the tools exposed to the model
pub mod tools {
    /// Create one or more tasks
    pub const CREATE_TASK: &str = "create_task";
    /// Create one or more calendar events
    pub const CREATE_EVENT: &str = "create_event";
    /// Create a note
    pub const CREATE_NOTE: &str = "create_note";
    /// Create a project
    pub const CREATE_PROJECT: &str = "create_project";
    /// Filtered listing of entities
    pub const QUERY_ENTITIES: &str = "query_entities";
    /// Free-text search across entities
    pub const SEARCH_ENTITIES: &str = "search_entities";
    /// Update a task
    pub const UPDATE_TASK: &str = "update_task";
    /// Delete any entity
    pub const DELETE_ENTITY: &str = "delete_entity";
    /// Compute named statistics
    pub const GET_STATISTICS: &str = "get_statistics";
}
