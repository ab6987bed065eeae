// ABOUTME: Error types re-exported from agenda-core
// ABOUTME: AppError, ErrorCode, ToolError, and the AppResult alias
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # Error Handling
//!
//! All fallible operations return [`AppResult`]. The HTTP layer turns an
//! [`AppError`] into a status code and an [`ErrorResponse`] body; the tool
//! layer turns it into a failed tool result instead.

pub use agenda_core::errors::*;
