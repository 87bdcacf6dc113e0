//! Dashboard controller: owns the in-memory task list and reconciles local
//! edits against the backend.
//!
//! Mutations are confirm-then-reload: create/update/delete send the request
//! and re-fetch the whole list on success, because item identity is assigned
//! server-side. The completion toggle is the one optimistic path: it flips
//! locally first and reverts just that item if the server rejects the edit.

pub mod view;

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate};

use crate::api::tasks::TaskApi;
use crate::model::{Priority, Task, TaskDraft, TaskPatch};

pub use view::{View, due_label, filter_tasks, group_by_priority};

const LOAD_FAILED_MSG: &str = "Failed to load tasks. Please check your connection.";
const CREATE_FAILED_MSG: &str = "Failed to create task. Please try again.";
const UPDATE_FAILED_MSG: &str = "Failed to update task. Please try again.";
const DELETE_FAILED_MSG: &str = "Failed to delete task. Please try again.";
const TOGGLE_FAILED_MSG: &str = "Failed to update task status.";

/// Per-view task totals for the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewCounts {
    pub inbox: usize,
    pub today: usize,
    pub completed: usize,
}

pub struct Dashboard {
    api: Arc<dyn TaskApi>,
    tasks: Vec<Task>,
    loading: bool,
    error: Option<String>,
    last_refresh: Option<DateTime<Local>>,
    query: String,
    view: View,
}

impl Dashboard {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            loading: false,
            error: None,
            last_refresh: None,
            query: String::new(),
            view: View::default(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn last_refresh(&self) -> Option<DateTime<Local>> {
        self.last_refresh
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Tasks surviving the text filter and the active view, in list order.
    /// `today` comes from the caller so labels and the Today view follow the
    /// render-time date.
    pub fn visible_tasks(&self, today: NaiveDate) -> Vec<&Task> {
        filter_tasks(&self.tasks, &self.query, self.view, today)
    }

    /// The visible tasks grouped by priority (high, medium, low), empty
    /// groups left out.
    pub fn grouped(&self, today: NaiveDate) -> Vec<(Priority, Vec<&Task>)> {
        group_by_priority(&self.visible_tasks(today))
    }

    /// Totals per view over the whole list, ignoring the text filter.
    pub fn view_counts(&self, today: NaiveDate) -> ViewCounts {
        ViewCounts {
            inbox: filter_tasks(&self.tasks, "", View::Inbox, today).len(),
            today: filter_tasks(&self.tasks, "", View::Today, today).len(),
            completed: filter_tasks(&self.tasks, "", View::Completed, today).len(),
        }
    }

    // ── Operations ────────────────────────────────────────────────────

    /// Fetch the full collection and replace the local list wholesale.
    /// Failure leaves the previous list intact; no partial merges.
    pub async fn load_tasks(&mut self, show_spinner: bool) {
        if show_spinner {
            self.loading = true;
        }
        self.error = None;
        match self.api.list().await {
            Ok(tasks) => {
                self.tasks = tasks;
                self.last_refresh = Some(Local::now());
            }
            Err(err) => {
                tracing::error!(error = %err, "task list fetch failed");
                self.error = Some(LOAD_FAILED_MSG.to_string());
            }
        }
        self.loading = false;
    }

    /// Create, then reload. No optimistic insert: the new item's id is not
    /// known until the reload returns it.
    pub async fn create_task(&mut self, draft: &TaskDraft) {
        self.error = None;
        match self.api.create(draft).await {
            Ok(()) => self.load_tasks(false).await,
            Err(err) => {
                tracing::error!(error = %err, name = draft.name(), "task create failed");
                self.error = Some(CREATE_FAILED_MSG.to_string());
            }
        }
    }

    /// Replace a task's fields, then reload.
    pub async fn update_task(&mut self, id: i64, patch: &TaskPatch) {
        self.error = None;
        match self.api.update(id, patch).await {
            Ok(()) => self.load_tasks(false).await,
            Err(err) => {
                tracing::error!(error = %err, id, "task update failed");
                self.error = Some(UPDATE_FAILED_MSG.to_string());
            }
        }
    }

    /// Delete, then reload.
    pub async fn delete_task(&mut self, id: i64) {
        self.error = None;
        match self.api.delete(id).await {
            Ok(()) => self.load_tasks(false).await,
            Err(err) => {
                tracing::error!(error = %err, id, "task delete failed");
                self.error = Some(DELETE_FAILED_MSG.to_string());
            }
        }
    }

    /// Flip completion optimistically: the local status changes before the
    /// request goes out, and a rejection reverts only this item, leaving the
    /// rest of the list untouched.
    pub async fn toggle_completion(&mut self, id: i64) {
        let Some(idx) = self.tasks.iter().position(|t| t.id == id) else {
            tracing::warn!(id, "completion toggle on unknown task");
            return;
        };
        let prior = self.tasks[idx].status;
        self.tasks[idx].status = prior.toggled();
        let patch = TaskPatch::from(&self.tasks[idx]);

        let api = Arc::clone(&self.api);
        let request = async move { api.update(id, &patch).await };
        self.confirm_or_revert(
            request,
            move |tasks| {
                if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
                    task.status = prior;
                }
            },
            TOGGLE_FAILED_MSG,
        )
        .await;
    }

    /// Optimistic-edit plumbing: await remote confirmation of an
    /// already-applied local change, undoing it with `revert` on failure.
    async fn confirm_or_revert<F, R>(&mut self, request: F, revert: R, message: &str)
    where
        F: Future<Output = Result<(), crate::errors::ApiError>>,
        R: FnOnce(&mut Vec<Task>),
    {
        if let Err(err) = request.await {
            tracing::error!(error = %err, "optimistic edit rejected, reverting");
            revert(&mut self.tasks);
            self.error = Some(message.to_string());
        }
    }
}
