use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};

use super::client::ApiClient;
use super::tasks::{TodosResponse, tasks_from_response};
use crate::errors::ApiError;
use crate::model::{Task, User};

// ── Request/response payloads ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupProfile {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Response of `POST /authenticate`; the user record may be absent when the
/// backend is still finalizing cookie issuance.
#[derive(Debug, Default, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

/// Result of the session probe (`GET /todos`). A valid session may come back
/// with tasks but no user record; the session layer decides what that means.
#[derive(Debug, Default)]
pub struct SessionProbe {
    pub user: Option<User>,
    pub tasks: Vec<Task>,
}

// ── Gateway ───────────────────────────────────────────────────────────

/// Auth operations seam; implemented by the reqwest gateway and by scripted
/// mocks in tests.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn signup(&self, profile: &SignupProfile) -> Result<(), ApiError>;
    /// Returns the user record when the login response carries one.
    async fn login(&self, credentials: &Credentials) -> Result<Option<User>, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
    /// Probe for an existing session. A 401 is an error here; the session
    /// layer treats it as "anonymous", not as a fault.
    async fn check_session(&self) -> Result<SessionProbe, ApiError>;
}

/// Thin mapping of the auth endpoints onto the transport client.
#[derive(Debug, Clone)]
pub struct AuthGateway {
    client: Arc<ApiClient>,
}

impl AuthGateway {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthApi for AuthGateway {
    async fn signup(&self, profile: &SignupProfile) -> Result<(), ApiError> {
        let _: AuthResponse = self.client.post_json("/signup", profile).await?;
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<Option<User>, ApiError> {
        let resp: AuthResponse = self.client.post_json("/authenticate", credentials).await?;
        tracing::debug!(status = ?resp.status, has_user = resp.user.is_some(), "login response");
        Ok(resp.user)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let _: AuthResponse = self
            .client
            .post_json("/logout", &serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn check_session(&self) -> Result<SessionProbe, ApiError> {
        let resp: TodosResponse = self.client.get_json("/todos").await?;
        let user = resp.user.clone();
        let tasks = tasks_from_response(resp, Local::now().date_naive());
        Ok(SessionProbe { user, tasks })
    }
}
