// ABOUTME: Limits and tool names re-exported from agenda-core
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

pub use agenda_core::constants::*;
