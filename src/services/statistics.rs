// ABOUTME: Workspace metrics shared by the system prompt snapshot and the get_statistics tool
// ABOUTME: Each named metric is computed independently from owner-scoped store counters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::constants::limits::UPCOMING_EVENTS_DAYS;
use crate::errors::{AppError, AppResult};
use crate::models::TaskStatus;
use crate::utils::time::{day_bounds, week_bounds};
use crate::workspace::{TaskCount, WorkspaceStore};

/// Live counts placed in every system prompt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    /// Tasks still todo or in progress
    pub open_tasks: i64,
    /// Open tasks past their due date
    pub overdue_tasks: i64,
    /// Open tasks due during the local day
    pub due_today: i64,
    /// Tasks completed during the local day
    pub completed_today: i64,
    /// Events starting within the next week
    pub upcoming_events: i64,
    /// Projects owned
    pub projects: i64,
}

/// Metrics `get_statistics` can compute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// The full snapshot
    Overview,
    /// Tasks completed today
    CompletedToday,
    /// Tasks completed since local Monday
    CompletedThisWeek,
    /// Open tasks past due
    OverdueTasks,
    /// Events in the next seven days
    UpcomingEvents,
    /// Task count per status
    TasksByStatus,
    /// Completion ratio of one project
    ProjectProgress,
}

impl Metric {
    /// Every metric, in catalog order
    pub const ALL: [Self; 7] = [
        Self::Overview,
        Self::CompletedToday,
        Self::CompletedThisWeek,
        Self::OverdueTasks,
        Self::UpcomingEvents,
        Self::TasksByStatus,
        Self::ProjectProgress,
    ];

    /// Name used in tool arguments
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::CompletedToday => "completed_today",
            Self::CompletedThisWeek => "completed_this_week",
            Self::OverdueTasks => "overdue_tasks",
            Self::UpcomingEvents => "upcoming_events",
            Self::TasksByStatus => "tasks_by_status",
            Self::ProjectProgress => "project_progress",
        }
    }

    /// Comma-separated list for error messages and schemas
    #[must_use]
    pub fn catalog() -> String {
        Self::ALL.map(Self::as_str).join(", ")
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|metric| metric.as_str() == s.trim())
            .ok_or_else(|| {
                AppError::invalid_input(format!(
                    "Unknown metric '{s}'. Available metrics: {}",
                    Self::catalog()
                ))
            })
    }
}

/// Computes metrics for one owner at one instant
pub struct StatisticsService<'a> {
    store: &'a dyn WorkspaceStore,
    owner_id: Uuid,
    timezone: Tz,
    now: DateTime<Utc>,
}

impl<'a> StatisticsService<'a> {
    /// Service reading `store` on behalf of `owner_id`
    #[must_use]
    pub const fn new(
        store: &'a dyn WorkspaceStore,
        owner_id: Uuid,
        timezone: Tz,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            store,
            owner_id,
            timezone,
            now,
        }
    }

    /// The counts shown in the system prompt
    ///
    /// # Errors
    ///
    /// Returns an error if a store query fails.
    pub async fn snapshot(&self) -> AppResult<WorkspaceSnapshot> {
        Ok(WorkspaceSnapshot {
            open_tasks: self.store.count_tasks(self.owner_id, TaskCount::Open).await?,
            overdue_tasks: self.overdue_tasks().await?,
            due_today: self.due_today().await?,
            completed_today: self.completed_today().await?,
            upcoming_events: self.upcoming_events().await?,
            projects: self.store.count_projects(self.owner_id).await?,
        })
    }

    /// Compute one metric. `project_id` is only read by `project_progress`.
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` when `project_progress` has no project,
    /// or an error if a store query fails.
    pub async fn compute(&self, metric: Metric, project_id: Option<Uuid>) -> AppResult<Value> {
        let value = match metric {
            Metric::Overview => serde_json::to_value(self.snapshot().await?)?,
            Metric::CompletedToday => json!({ "count": self.completed_today().await? }),
            Metric::CompletedThisWeek => {
                let (start, end) = week_bounds(self.now, self.timezone)?;
                let count = self
                    .store
                    .count_tasks(self.owner_id, TaskCount::CompletedBetween(start, end))
                    .await?;
                json!({ "count": count, "week_start": start.to_rfc3339() })
            }
            Metric::OverdueTasks => json!({ "count": self.overdue_tasks().await? }),
            Metric::UpcomingEvents => json!({
                "count": self.upcoming_events().await?,
                "days": UPCOMING_EVENTS_DAYS,
            }),
            Metric::TasksByStatus => Self::status_map(
                &self
                    .store
                    .task_status_breakdown(self.owner_id, None)
                    .await?,
            ),
            Metric::ProjectProgress => {
                let project_id =
                    project_id.ok_or_else(|| AppError::missing_field("project"))?;
                self.project_progress(project_id).await?
            }
        };
        Ok(value)
    }

    async fn overdue_tasks(&self) -> AppResult<i64> {
        self.store
            .count_tasks(self.owner_id, TaskCount::Overdue(self.now))
            .await
    }

    async fn due_today(&self) -> AppResult<i64> {
        let (start, end) = day_bounds(self.now, self.timezone)?;
        self.store
            .count_tasks(self.owner_id, TaskCount::OpenDueBetween(start, end))
            .await
    }

    async fn completed_today(&self) -> AppResult<i64> {
        let (start, end) = day_bounds(self.now, self.timezone)?;
        self.store
            .count_tasks(self.owner_id, TaskCount::CompletedBetween(start, end))
            .await
    }

    async fn upcoming_events(&self) -> AppResult<i64> {
        let end = self.now + Duration::days(UPCOMING_EVENTS_DAYS);
        self.store
            .count_events_between(self.owner_id, self.now, end)
            .await
    }

    async fn project_progress(&self, project_id: Uuid) -> AppResult<Value> {
        let breakdown = self
            .store
            .task_status_breakdown(self.owner_id, Some(project_id))
            .await?;
        let total: i64 = breakdown.iter().map(|(_, n)| n).sum();
        let done = breakdown
            .iter()
            .find(|(status, _)| *status == TaskStatus::Done)
            .map_or(0, |(_, n)| *n);
        // Whole percent, rounded down; an empty project is 0%
        let percent = if total == 0 { 0 } else { done * 100 / total };

        Ok(json!({
            "project_id": project_id,
            "total_tasks": total,
            "done": done,
            "percent_complete": percent,
            "by_status": Self::status_map(&breakdown),
        }))
    }

    fn status_map(breakdown: &[(TaskStatus, i64)]) -> Value {
        let map: Map<String, Value> = breakdown
            .iter()
            .map(|(status, n)| (status.as_str().to_owned(), json!(n)))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono_tz::Europe;

    use super::*;
    use crate::database::Database;
    use crate::workspace::{NewProject, NewTask};

    #[test]
    fn test_unknown_metric_names_it() {
        let err = "bogus_metric".parse::<Metric>().unwrap_err();
        assert!(err.message.contains("bogus_metric"));
        assert!(err.message.contains("completed_today"));
        assert_eq!("tasks_by_status".parse::<Metric>().unwrap(), Metric::TasksByStatus);
    }

    #[tokio::test]
    async fn test_snapshot_counts_overdue_and_due_today() {
        let store = Database::in_memory().await.unwrap().workspace();
        let owner = Uuid::new_v4();
        let now = Utc::now();

        let overdue = NewTask {
            title: "Late".to_owned(),
            due_date: Some(now - Duration::days(2)),
            ..NewTask::default()
        };
        let done = NewTask {
            title: "Finished".to_owned(),
            status: TaskStatus::Done,
            ..NewTask::default()
        };
        store.create_task(owner, &overdue).await.unwrap();
        store.create_task(owner, &done).await.unwrap();

        let stats = StatisticsService::new(&store, owner, Europe::Rome, now);
        let snapshot = stats.snapshot().await.unwrap();
        assert_eq!(snapshot.open_tasks, 1);
        assert_eq!(snapshot.overdue_tasks, 1);
        assert_eq!(snapshot.completed_today, 1);
        assert_eq!(snapshot.projects, 0);
    }

    #[tokio::test]
    async fn test_project_progress_percent() {
        let store = Database::in_memory().await.unwrap().workspace();
        let owner = Uuid::new_v4();
        let project = store
            .create_project(
                owner,
                &NewProject {
                    name: "Launch".to_owned(),
                    description: None,
                },
            )
            .await
            .unwrap();
        for (title, status) in [
            ("a", TaskStatus::Done),
            ("b", TaskStatus::Todo),
            ("c", TaskStatus::InProgress),
        ] {
            let task = NewTask {
                title: title.to_owned(),
                status,
                project_id: Some(project.id),
                ..NewTask::default()
            };
            store.create_task(owner, &task).await.unwrap();
        }

        let stats = StatisticsService::new(&store, owner, Europe::Rome, Utc::now());
        let value = stats
            .compute(Metric::ProjectProgress, Some(project.id))
            .await
            .unwrap();
        assert_eq!(value["total_tasks"], 3);
        assert_eq!(value["done"], 1);
        assert_eq!(value["percent_complete"], 33);

        let err = stats.compute(Metric::ProjectProgress, None).await.unwrap_err();
        assert!(err.message.contains("project"));
    }
}
