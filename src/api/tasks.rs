use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::client::ApiClient;
use crate::errors::ApiError;
use crate::model::{Category, Priority, Task, TaskDraft, TaskPatch, TaskStatus, User};

// ── Wire types ────────────────────────────────────────────────────────

/// A to-do item as the backend marshals it (Go struct field names).
#[derive(Debug, Clone, Deserialize)]
pub struct TodoRecord {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "UserID", default)]
    pub user_id: i64,
    #[serde(rename = "Priority", default)]
    pub priority: String,
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "DueDate", default)]
    pub due_date: String,
    #[serde(rename = "CreatedAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Response of `GET /todos`. Doubles as the session probe: `user` and
/// `todos` are both optional, and an empty task list arrives as `null`.
#[derive(Debug, Default, Deserialize)]
pub struct TodosResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub todos: Option<Vec<TodoRecord>>,
}

#[derive(Debug, Serialize)]
struct SaveTodoRequest<'a> {
    content: &'a str,
    priority: &'a str,
    #[serde(rename = "dueDate")]
    due_date: String,
}

#[derive(Debug, Serialize)]
struct UpdateTodoRequest<'a> {
    content: &'a str,
    priority: &'a str,
    status: &'a str,
    #[serde(rename = "dueDate")]
    due_date: String,
}

/// Mutation acknowledgement (`{status, message}`); all fields optional so an
/// empty body still decodes.
#[derive(Debug, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ── Wire → UI translation ─────────────────────────────────────────────

/// Translate a wire record into the UI task shape.
///
/// Defaults mirror the backend's own COALESCE rules: missing or unknown
/// priority → medium, unparsable due date → today. The category label is a
/// one-way display enrichment derived from the task's text.
pub fn task_from_record(rec: TodoRecord, today: NaiveDate) -> Task {
    let due_date = NaiveDate::parse_from_str(&rec.due_date, "%Y-%m-%d").unwrap_or_else(|_| {
        tracing::warn!(id = rec.id, due = %rec.due_date, "unparsable due date, defaulting to today");
        today
    });
    Task {
        id: rec.id,
        category: Category::from_content(&rec.content),
        status: TaskStatus::from_wire(&rec.status),
        priority: rec.priority.parse().unwrap_or(Priority::Medium),
        name: rec.content,
        due_date,
        created_at: rec.created_at,
    }
}

pub fn tasks_from_response(resp: TodosResponse, today: NaiveDate) -> Vec<Task> {
    resp.todos
        .unwrap_or_default()
        .into_iter()
        .map(|rec| task_from_record(rec, today))
        .collect()
}

// ── Gateway ───────────────────────────────────────────────────────────

/// Task CRUD seam; implemented by the reqwest gateway and by scripted mocks
/// in tests.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>, ApiError>;
    async fn create(&self, draft: &TaskDraft) -> Result<(), ApiError>;
    async fn update(&self, id: i64, patch: &TaskPatch) -> Result<(), ApiError>;
    async fn delete(&self, id: i64) -> Result<(), ApiError>;
}

/// Maps task operations onto the transport client.
#[derive(Debug, Clone)]
pub struct TaskGateway {
    client: Arc<ApiClient>,
}

impl TaskGateway {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskApi for TaskGateway {
    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        let resp: TodosResponse = self.client.get_json("/todos").await?;
        Ok(tasks_from_response(resp, Local::now().date_naive()))
    }

    async fn create(&self, draft: &TaskDraft) -> Result<(), ApiError> {
        let req = SaveTodoRequest {
            content: draft.name(),
            priority: draft.priority.as_str(),
            due_date: draft.due_date.format("%Y-%m-%d").to_string(),
        };
        let _: Ack = self.client.post_json("/todos/save", &req).await?;
        Ok(())
    }

    async fn update(&self, id: i64, patch: &TaskPatch) -> Result<(), ApiError> {
        let req = UpdateTodoRequest {
            content: &patch.name,
            priority: patch.priority.as_str(),
            status: patch.status.as_wire(),
            due_date: patch.due_date.format("%Y-%m-%d").to_string(),
        };
        let _: Ack = self
            .client
            .post_json(&format!("/todos/update/{id}"), &req)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let _: Ack = self
            .client
            .post_json(&format!("/todos/delete/{id}"), &serde_json::json!({}))
            .await?;
        Ok(())
    }
}
