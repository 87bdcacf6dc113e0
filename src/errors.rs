//! Typed error hierarchy for the TaskMaster client.
//!
//! Two top-level enums cover the two subsystems:
//! - `ApiError` — transport-level failures from the HTTP client
//! - `SessionError` — auth operations re-raised to the caller for flow control

use thiserror::Error;

/// Errors from the HTTP transport layer.
///
/// A non-2xx status is surfaced uniformly as `Status`; the response body is
/// not interpreted. An empty 2xx body is not an error (it decodes as the
/// empty object), so `Decode` only fires on malformed non-empty payloads.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned HTTP {status}")]
    Status { status: u16 },

    #[error("invalid JSON in response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid API base URL '{url}'")]
    BadBaseUrl { url: String },
}

impl ApiError {
    /// The HTTP status code, when this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Errors re-raised from session operations so callers can suppress
/// navigation after a failed attempt. Session-probe failures are deliberately
/// absent: an anonymous visitor is an expected state, not a fault.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("login failed")]
    LoginFailed(#[source] ApiError),

    #[error("signup failed")]
    SignupFailed(#[source] ApiError),
}
