// ABOUTME: Turns a human-readable reference into exactly one entity id, or reports why not
// ABOUTME: Identifier-shaped references bypass search; text goes through owner-scoped search
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # Entity Resolver
//!
//! Mutating tools accept either an id or words the user actually said
//! ("the Foo task"). The resolver never guesses: zero hits and several hits
//! are both reported back so the model can ask the user.

use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::constants::limits::RESOLVER_SEARCH_LIMIT;
use crate::errors::AppResult;
use crate::models::{EntityCandidate, EntityKind, ToolResult};
use crate::utils::uuid::canonical_uuid;
use crate::workspace::WorkspaceStore;

/// Outcome of resolving one reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one entity
    Resolved(Uuid),
    /// Nothing matched
    NotFound,
    /// More than one entity matched; all candidates are listed
    Ambiguous(Vec<EntityCandidate>),
}

impl Resolution {
    /// The id, or a failed tool result explaining why there is none.
    ///
    /// Ambiguity carries `data.matches` so the model can present the choices.
    ///
    /// # Errors
    ///
    /// Returns the failed [`ToolResult`] for `NotFound` and `Ambiguous`.
    pub fn into_id(self, kind: EntityKind, reference: &str) -> Result<Uuid, ToolResult> {
        match self {
            Self::Resolved(id) => Ok(id),
            Self::NotFound => Err(ToolResult::failure(format!(
                "No {kind} found matching '{reference}'"
            ))),
            Self::Ambiguous(candidates) => {
                let matches: Vec<_> = candidates
                    .iter()
                    .map(|c| json!({ "id": c.id, "title": c.label }))
                    .collect();
                Err(ToolResult::failure_with_data(
                    format!(
                        "{} {kind}s match '{reference}'. Ask the user which one they mean.",
                        candidates.len()
                    ),
                    json!({ "matches": matches }),
                ))
            }
        }
    }
}

/// Resolver bound to one owner
pub struct EntityResolver<'a> {
    store: &'a dyn WorkspaceStore,
    owner_id: Uuid,
}

impl<'a> EntityResolver<'a> {
    /// Resolver over `store` for `owner_id`
    #[must_use]
    pub const fn new(store: &'a dyn WorkspaceStore, owner_id: Uuid) -> Self {
        Self { store, owner_id }
    }

    /// Resolve `reference` to one entity of `kind`.
    ///
    /// A canonical UUID is returned as-is without touching the store;
    /// existence is checked by the operation that uses it.
    ///
    /// # Errors
    ///
    /// Returns an error if the search query fails.
    pub async fn resolve(&self, kind: EntityKind, reference: &str) -> AppResult<Resolution> {
        if let Some(id) = canonical_uuid(reference) {
            return Ok(Resolution::Resolved(id));
        }

        let text = reference.trim();
        if text.is_empty() {
            return Ok(Resolution::NotFound);
        }

        let mut candidates = self
            .store
            .search(self.owner_id, kind, text, RESOLVER_SEARCH_LIMIT)
            .await?;
        debug!(%kind, reference = text, hits = candidates.len(), "Resolved reference");

        Ok(match candidates.len() {
            0 => Resolution::NotFound,
            1 => Resolution::Resolved(candidates.remove(0).id),
            _ => Resolution::Ambiguous(candidates),
        })
    }

    /// Resolve an optional reference, failing like [`Resolution::into_id`]
    ///
    /// # Errors
    ///
    /// The outer error is a store failure; the inner one is a failed
    /// [`ToolResult`] for a missing or ambiguous entity.
    pub async fn resolve_optional(
        &self,
        kind: EntityKind,
        reference: Option<&str>,
    ) -> AppResult<Result<Option<Uuid>, ToolResult>> {
        let Some(reference) = reference else {
            return Ok(Ok(None));
        };
        let resolution = self.resolve(kind, reference).await?;
        Ok(resolution.into_id(kind, reference).map(Some))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use crate::database::Database;
    use crate::models::{TaskPriority, TaskStatus};
    use crate::workspace::NewTask;

    fn task(title: &str) -> NewTask {
        NewTask {
            title: title.to_owned(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            project_id: None,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_resolution_outcomes() {
        let db = Database::in_memory().await.unwrap();
        let store = db.workspace();
        let owner_id = Uuid::new_v4();
        let report = store.create_task(owner_id, &task("Quarterly report")).await.unwrap();
        store.create_task(owner_id, &task("Foo")).await.unwrap();
        store.create_task(owner_id, &task("Foo")).await.unwrap();
        let resolver = EntityResolver::new(&store, owner_id);

        assert_eq!(
            resolver.resolve(EntityKind::Task, "report").await.unwrap(),
            Resolution::Resolved(report.id)
        );
        assert_eq!(
            resolver.resolve(EntityKind::Task, "dentist").await.unwrap(),
            Resolution::NotFound
        );
        assert_eq!(
            resolver.resolve(EntityKind::Task, "   ").await.unwrap(),
            Resolution::NotFound
        );

        let Resolution::Ambiguous(candidates) =
            resolver.resolve(EntityKind::Task, "foo").await.unwrap()
        else {
            panic!("expected an ambiguous resolution");
        };
        assert_eq!(candidates.len(), 2);

        let failed = Resolution::Ambiguous(candidates)
            .into_id(EntityKind::Task, "foo")
            .unwrap_err();
        assert!(!failed.success);
        assert_eq!(failed.data.unwrap()["matches"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_identifier_is_not_searched() {
        let db = Database::in_memory().await.unwrap();
        let store = db.workspace();
        let resolver = EntityResolver::new(&store, Uuid::new_v4());

        let id = Uuid::new_v4();
        assert_eq!(
            resolver.resolve(EntityKind::Note, &id.to_string()).await.unwrap(),
            Resolution::Resolved(id)
        );
        assert_eq!(
            resolver.resolve(EntityKind::Note, "anything").await.unwrap(),
            Resolution::NotFound
        );
    }
}
