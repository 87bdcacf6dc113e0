use std::time::Duration;

/// Default backend address, matching the development server.
const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PROMPT_DELAY_MS: u64 = 1500;

/// Runtime configuration for the client.
///
/// Values come from defaults overridden by the environment; the binary loads
/// a `.env` file first so local setups can pin `TASKMASTER_API_URL` without
/// exporting anything.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the TaskMaster backend.
    pub base_url: String,
    /// Per-request timeout for the HTTP client.
    pub request_timeout: Duration,
    /// How long the dashboard waits with no session before interrupting the
    /// user with the login prompt.
    pub login_prompt_delay: Duration,
    /// Retry schedule for resolving identity after a login response that
    /// carried no user record.
    pub identity_probe: ProbeBackoff,
}

/// Bounded retry-with-backoff schedule for the post-login identity probe.
///
/// The backend may still be finalizing session cookie issuance when the
/// login response arrives; rather than a single fixed sleep, the probe is
/// retried a few times with growing delays.
#[derive(Debug, Clone, Copy)]
pub struct ProbeBackoff {
    pub attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: u32,
}

impl Default for ProbeBackoff {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_delay: Duration::from_millis(500),
            multiplier: 2,
        }
    }
}

impl ProbeBackoff {
    /// Delay before the given zero-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay * self.multiplier.pow(attempt).max(1)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            login_prompt_delay: Duration::from_millis(DEFAULT_PROMPT_DELAY_MS),
            identity_probe: ProbeBackoff::default(),
        }
    }
}

impl ClientConfig {
    /// Build a config from the environment, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(url) = std::env::var("TASKMASTER_API_URL") {
            if !url.trim().is_empty() {
                cfg.base_url = url.trim_end_matches('/').to_string();
            }
        }
        if let Some(secs) = env_u64("TASKMASTER_TIMEOUT_SECS") {
            cfg.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = env_u64("TASKMASTER_PROMPT_DELAY_MS") {
            cfg.login_prompt_delay = Duration::from_millis(ms);
        }
        cfg
    }

    /// Override the backend address, trimming any trailing slash.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}
