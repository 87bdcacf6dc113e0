//! Pure presentation logic for the task list: view selection, text filtering,
//! priority grouping, and due-date labels. Everything here is a function of
//! its inputs; callers pass today's date in so rendering never caches it.

use chrono::NaiveDate;

use crate::model::{Priority, Task};

// ── View selection ────────────────────────────────────────────────────

/// The dashboard's list selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// All non-completed tasks.
    #[default]
    Inbox,
    /// Non-completed tasks due today.
    Today,
    /// Completed tasks only.
    Completed,
}

impl View {
    pub const ALL: [View; 3] = [View::Inbox, View::Today, View::Completed];

    pub fn label(&self) -> &'static str {
        match self {
            View::Inbox => "Inbox",
            View::Today => "Today",
            View::Completed => "Completed",
        }
    }

    fn admits(&self, task: &Task, today: NaiveDate) -> bool {
        match self {
            View::Inbox => !task.status.is_completed(),
            View::Today => !task.status.is_completed() && task.due_date == today,
            View::Completed => task.status.is_completed(),
        }
    }
}

/// Apply the free-text filter, then the view selector. The query matches by
/// case-insensitive substring on the task name; order of surviving tasks is
/// preserved.
pub fn filter_tasks<'a>(
    tasks: &'a [Task],
    query: &str,
    view: View,
    today: NaiveDate,
) -> Vec<&'a Task> {
    let needle = query.trim().to_lowercase();
    tasks
        .iter()
        .filter(|t| needle.is_empty() || t.name.to_lowercase().contains(&needle))
        .filter(|t| view.admits(t, today))
        .collect()
}

// ── Priority grouping ─────────────────────────────────────────────────

/// Group tasks by priority in the fixed high, medium, low order, leaving out
/// groups with no tasks. Item order within a group is preserved.
pub fn group_by_priority<'a>(tasks: &[&'a Task]) -> Vec<(Priority, Vec<&'a Task>)> {
    Priority::ALL
        .into_iter()
        .filter_map(|priority| {
            let group: Vec<&Task> = tasks
                .iter()
                .copied()
                .filter(|t| t.priority == priority)
                .collect();
            (!group.is_empty()).then_some((priority, group))
        })
        .collect()
}

// ── Due-date labels ───────────────────────────────────────────────────

/// Human label for a due date, relative to `today`. Derived at render time,
/// never stored on the task.
pub fn due_label(due: NaiveDate, today: NaiveDate) -> String {
    if due == today {
        "Today".to_string()
    } else if due == today.succ_opt().unwrap_or(today) {
        "Tomorrow".to_string()
    } else if due < today {
        "Overdue".to_string()
    } else {
        due.format("%b %-d").to_string()
    }
}
