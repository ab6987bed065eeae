// ABOUTME: UUID parsing and validation utilities
// ABOUTME: Recognizes canonical identifiers so references can skip text search
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Length of the hyphenated form, e.g. `67e55044-10b1-426f-9247-bb680e5fe0c8`
const CANONICAL_LEN: usize = 36;

/// Parse `reference` only if it is a canonical hyphenated UUID.
///
/// Braced, URN, or simple (32 hex digits) forms are treated as text.
#[must_use]
pub fn canonical_uuid(reference: &str) -> Option<Uuid> {
    let reference = reference.trim();
    if reference.len() != CANONICAL_LEN {
        return None;
    }
    Uuid::parse_str(reference).ok()
}

/// Parse a UUID from a string with consistent error handling
///
/// # Errors
///
/// Returns an error if the string is not a valid UUID format
pub fn parse_uuid(uuid_str: &str) -> AppResult<Uuid> {
    Uuid::parse_str(uuid_str)
        .map_err(|_| AppError::invalid_format(format!("Invalid UUID format: '{uuid_str}'")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_canonical_uuid_only_accepts_hyphenated_form() {
        let id = Uuid::new_v4();
        assert_eq!(canonical_uuid(&id.to_string()), Some(id));
        assert_eq!(canonical_uuid(&format!(" {id} ")), Some(id));
        assert_eq!(canonical_uuid(&id.simple().to_string()), None);
        assert_eq!(canonical_uuid("Call Mario"), None);
        assert_eq!(canonical_uuid("zzzzzzzz-zzzz-zzzz-zzzz-zzzzzzzzzzzz"), None);
    }

    #[test]
    fn test_parse_uuid_reports_input() {
        let err = parse_uuid("nope").unwrap_err();
        assert!(err.message.contains("'nope'"));
    }
}
