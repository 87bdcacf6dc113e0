//! HTTP glue: the transport client and the auth/task gateways that map the
//! backend's endpoints onto typed operations.

pub mod auth;
pub mod client;
pub mod tasks;

pub use auth::{AuthApi, AuthGateway, Credentials, SessionProbe, SignupProfile};
pub use client::ApiClient;
pub use tasks::{TaskApi, TaskGateway};
