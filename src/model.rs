//! UI-facing domain types for the TaskMaster client.
//!
//! The wire representation (Go-marshalled field names, lowercase status
//! tokens) lives in `crate::api::tasks`; everything here is what the
//! dashboard and session logic operate on.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ── Identity ──────────────────────────────────────────────────────────

/// An authenticated user. Absent entirely when anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl User {
    /// Placeholder identity used when the session probe proves a valid
    /// session exists but returns no user record.
    pub fn placeholder() -> Self {
        Self {
            id: 0,
            name: "User".to_string(),
            email: String::new(),
        }
    }
}

// ── Task status ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Wire token as the backend stores it.
    pub fn as_wire(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Parse a wire token; anything unrecognized falls back to To Do, which
    /// is also the backend's own default.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "completed" => TaskStatus::Completed,
            "in_progress" => TaskStatus::InProgress,
            _ => TaskStatus::Todo,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// The status after a completion toggle.
    pub fn toggled(&self) -> Self {
        if self.is_completed() {
            TaskStatus::Todo
        } else {
            TaskStatus::Completed
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        };
        f.write_str(label)
    }
}

// ── Priority ──────────────────────────────────────────────────────────

/// Task priority; the declaration order is the fixed grouping order on the
/// dashboard (high, medium, low).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Derived category label ────────────────────────────────────────────

/// Display-only project/category label derived from keywords in the task's
/// text. One-way enrichment: never persisted, never sent back to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Work,
    Team,
    Personal,
    General,
}

impl Category {
    pub fn from_content(content: &str) -> Self {
        let content = content.to_lowercase();
        let has = |kw: &str| content.contains(kw);
        if has("work") || has("meeting") || has("project") {
            Category::Work
        } else if has("team") || has("collaborate") {
            Category::Team
        } else if has("personal") || has("home") || has("family") {
            Category::Personal
        } else {
            Category::General
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Work => "Work",
            Category::Team => "Team",
            Category::Personal => "Personal",
            Category::General => "General",
        };
        f.write_str(label)
    }
}

// ── Task ──────────────────────────────────────────────────────────────

/// A to-do item as the dashboard sees it. `id` is assigned by the server and
/// treated as opaque and immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: NaiveDate,
    pub category: Category,
    pub created_at: Option<DateTime<Utc>>,
}

// ── Drafts and patches ────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
#[error("task name must not be empty")]
pub struct EmptyTaskName;

/// Input for creating a task. Construction validates the name so a blank
/// draft is rejected before any network call happens.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    name: String,
    pub priority: Priority,
    pub due_date: NaiveDate,
}

impl TaskDraft {
    pub fn new(
        name: &str,
        priority: Priority,
        due_date: NaiveDate,
    ) -> Result<Self, EmptyTaskName> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EmptyTaskName);
        }
        Ok(Self {
            name: name.to_string(),
            priority,
            due_date,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Full replacement payload for a task update; the backend's update endpoint
/// expects every field on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPatch {
    pub name: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: NaiveDate,
}

impl From<&Task> for TaskPatch {
    fn from(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            priority: task.priority,
            status: task.status,
            due_date: task.due_date,
        }
    }
}

impl TaskPatch {
    /// The same task with a different status, for the completion toggle.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_roundtrip() {
        for status in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Completed] {
            assert_eq!(TaskStatus::from_wire(status.as_wire()), status);
        }
    }

    #[test]
    fn unknown_status_defaults_to_todo() {
        assert_eq!(TaskStatus::from_wire("archived"), TaskStatus::Todo);
        assert_eq!(TaskStatus::from_wire(""), TaskStatus::Todo);
    }

    #[test]
    fn status_display_labels() {
        assert_eq!(TaskStatus::Todo.to_string(), "To Do");
        assert_eq!(TaskStatus::InProgress.to_string(), "In Progress");
        assert_eq!(TaskStatus::Completed.to_string(), "Completed");
    }

    #[test]
    fn toggle_flips_between_todo_and_completed() {
        assert_eq!(TaskStatus::Todo.toggled(), TaskStatus::Completed);
        assert_eq!(TaskStatus::Completed.toggled(), TaskStatus::Todo);
        // In-progress tasks complete on toggle, they do not reset
        assert_eq!(TaskStatus::InProgress.toggled(), TaskStatus::Completed);
    }

    #[test]
    fn priority_parse_and_display() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::Medium.to_string(), "medium");
    }

    #[test]
    fn priority_grouping_order_is_high_medium_low() {
        assert_eq!(
            Priority::ALL,
            [Priority::High, Priority::Medium, Priority::Low]
        );
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Medium < Priority::Low);
    }

    #[test]
    fn category_keyword_families() {
        assert_eq!(Category::from_content("Finish project proposal"), Category::Work);
        assert_eq!(Category::from_content("weekly MEETING notes"), Category::Work);
        assert_eq!(Category::from_content("collaborate on design"), Category::Team);
        assert_eq!(Category::from_content("Team retro"), Category::Team);
        assert_eq!(Category::from_content("family dinner at home"), Category::Personal);
        assert_eq!(Category::from_content("buy milk"), Category::General);
    }

    #[test]
    fn work_keywords_win_over_team_keywords() {
        // "project" is checked before "team"; mixed content lands on Work
        assert_eq!(Category::from_content("team project kickoff"), Category::Work);
    }

    #[test]
    fn placeholder_identity_shape() {
        let user = User::placeholder();
        assert_eq!(user.id, 0);
        assert_eq!(user.name, "User");
        assert!(user.email.is_empty());
    }

    #[test]
    fn blank_draft_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        assert_eq!(
            TaskDraft::new("  ", Priority::Medium, today),
            Err(EmptyTaskName)
        );
        assert_eq!(TaskDraft::new("", Priority::High, today), Err(EmptyTaskName));
    }

    #[test]
    fn draft_trims_its_name() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let draft = TaskDraft::new("  write report  ", Priority::High, today).unwrap();
        assert_eq!(draft.name(), "write report");
    }

    #[test]
    fn patch_from_task_carries_all_fields() {
        let task = Task {
            id: 7,
            name: "read book".to_string(),
            status: TaskStatus::Todo,
            priority: Priority::Low,
            due_date: NaiveDate::from_ymd_opt(2026, 8, 24).unwrap(),
            category: Category::General,
            created_at: None,
        };
        let patch = TaskPatch::from(&task).with_status(TaskStatus::Completed);
        assert_eq!(patch.name, "read book");
        assert_eq!(patch.priority, Priority::Low);
        assert_eq!(patch.status, TaskStatus::Completed);
        assert_eq!(patch.due_date, task.due_date);
    }
}
