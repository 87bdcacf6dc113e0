//! Client-side session lifecycle.
//!
//! The authentication state is an explicit tagged phase rather than a pile of
//! booleans: `Initializing | Anonymous { prompting } | Authenticated(user)`.
//! By construction the login prompt can only show while anonymous, never
//! during the startup probe and never with a user present. "Has the auth
//! check run" is simply "the phase has left `Initializing`".
//!
//! `Session` is a cheap clone over shared state with an enumerated operation
//! API; consumers receive it by value instead of reaching for a global. All
//! mutation happens through the operations below on the main event flow.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::api::auth::{AuthApi, Credentials, SignupProfile};
use crate::config::{ClientConfig, ProbeBackoff};
use crate::errors::SessionError;
use crate::model::User;

const LOGIN_FAILED_MSG: &str = "Login failed. Please check your credentials.";
const SIGNUP_FAILED_MSG: &str = "Signup failed. Please try again.";
const LOGOUT_FAILED_MSG: &str = "Logout failed, but you have been logged out locally.";

// ── State ─────────────────────────────────────────────────────────────

/// Which view the client started on. Only the protected dashboard triggers
/// the startup probe and the login prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Public,
}

/// The authentication phase of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthPhase {
    /// Startup probe not finished yet. Entered exactly once, never re-entered.
    Initializing,
    /// No session. `prompting` is the dismissible login interstitial.
    Anonymous { prompting: bool },
    Authenticated(User),
}

#[derive(Debug)]
struct SessionState {
    phase: AuthPhase,
    loading: bool,
    error: Option<String>,
    route: Route,
    /// Bumped on every mutation; pending prompt timers compare it at fire
    /// time so any state change cancels them.
    epoch: u64,
}

impl SessionState {
    /// Drop to anonymous, preserving an already-showing prompt (a failed
    /// re-probe does not yank the interstitial away).
    fn clear_identity(&mut self) {
        self.phase = match self.phase {
            AuthPhase::Anonymous { prompting } => AuthPhase::Anonymous { prompting },
            _ => AuthPhase::Anonymous { prompting: false },
        };
    }

    fn qualifies_for_prompt(&self) -> bool {
        self.route == Route::Dashboard
            && !self.loading
            && matches!(self.phase, AuthPhase::Anonymous { prompting: false })
    }
}

/// Point-in-time view of the session, handed to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: AuthPhase,
    pub is_loading: bool,
    pub error: Option<String>,
    pub route: Route,
}

impl SessionSnapshot {
    pub fn user(&self) -> Option<&User> {
        match &self.phase {
            AuthPhase::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn is_initializing(&self) -> bool {
        matches!(self.phase, AuthPhase::Initializing)
    }

    pub fn has_checked_auth(&self) -> bool {
        !self.is_initializing()
    }

    pub fn show_login_prompt(&self) -> bool {
        matches!(self.phase, AuthPhase::Anonymous { prompting: true })
    }
}

// ── Session ───────────────────────────────────────────────────────────

struct SessionInner {
    auth: Arc<dyn AuthApi>,
    state: Mutex<SessionState>,
    prompt_delay: Duration,
    identity_probe: ProbeBackoff,
}

/// Owner of the session state machine. Clones share the same state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub fn new(auth: Arc<dyn AuthApi>, cfg: &ClientConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                auth,
                state: Mutex::new(SessionState {
                    phase: AuthPhase::Initializing,
                    loading: false,
                    error: None,
                    route: Route::Public,
                    epoch: 0,
                }),
                prompt_delay: cfg.login_prompt_delay,
                identity_probe: cfg.identity_probe,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // A poisoned lock only means a panic elsewhere; the state itself is
        // still coherent, so recover rather than cascade.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let st = self.lock();
        SessionSnapshot {
            phase: st.phase.clone(),
            is_loading: st.loading,
            error: st.error.clone(),
            route: st.route,
        }
    }

    // ── Operations ────────────────────────────────────────────────────

    /// Run the one-time startup check. Probes the backend only when starting
    /// on the protected dashboard; public pages skip the network call and
    /// just mark the check done. Whatever happens, the session leaves
    /// `Initializing` exactly once and never re-enters it.
    pub async fn initialize(&self, route: Route) {
        {
            let mut st = self.lock();
            if !matches!(st.phase, AuthPhase::Initializing) {
                tracing::warn!("session already initialized; ignoring");
                return;
            }
            st.route = route;
        }

        if route == Route::Dashboard {
            self.check_auth().await;
        } else {
            let mut st = self.lock();
            st.epoch += 1;
            st.phase = AuthPhase::Anonymous { prompting: false };
        }
    }

    /// Probe for an existing session and settle the phase accordingly.
    ///
    /// Probe failures are swallowed: an anonymous visitor is an expected
    /// state, not a user-visible fault.
    pub async fn check_auth(&self) {
        {
            let mut st = self.lock();
            st.epoch += 1;
            st.loading = true;
            st.error = None;
        }

        let outcome = self.inner.auth.check_session().await;

        {
            let mut st = self.lock();
            st.epoch += 1;
            match outcome {
                Ok(probe) => {
                    if let Some(user) = probe.user {
                        st.phase = AuthPhase::Authenticated(user);
                    } else if !probe.tasks.is_empty() {
                        // The session is valid but identity is unknown;
                        // treat it as authenticated under a placeholder.
                        st.phase = AuthPhase::Authenticated(User::placeholder());
                    } else {
                        st.clear_identity();
                    }
                }
                Err(err) => {
                    tracing::debug!(error = %err, "session probe found no session");
                    st.clear_identity();
                }
            }
            st.loading = false;
        }

        self.arm_login_prompt();
    }

    /// Authenticate. When the response carries no user record the backend
    /// may still be finalizing cookie issuance, so identity is resolved with
    /// a bounded retry-with-backoff probe. Failures set a generic message
    /// and re-raise so the caller can suppress navigation.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), SessionError> {
        {
            let mut st = self.lock();
            st.epoch += 1;
            st.error = None;
            st.loading = true;
            if let AuthPhase::Anonymous { prompting } = &mut st.phase {
                *prompting = false;
            }
        }

        let outcome = self.inner.auth.login(credentials).await;

        let result = match outcome {
            Ok(Some(user)) => {
                let mut st = self.lock();
                st.epoch += 1;
                st.phase = AuthPhase::Authenticated(user);
                Ok(())
            }
            Ok(None) => {
                self.resolve_identity_with_backoff().await;
                Ok(())
            }
            Err(err) => {
                let mut st = self.lock();
                st.epoch += 1;
                st.error = Some(LOGIN_FAILED_MSG.to_string());
                Err(SessionError::LoginFailed(err))
            }
        };

        {
            let mut st = self.lock();
            st.loading = false;
        }
        self.arm_login_prompt();
        result
    }

    /// Create an account. Never establishes a session; the caller is
    /// expected to log in separately.
    pub async fn signup(&self, profile: &SignupProfile) -> Result<(), SessionError> {
        {
            let mut st = self.lock();
            st.epoch += 1;
            st.error = None;
            st.loading = true;
        }

        let outcome = self.inner.auth.signup(profile).await;

        let result = {
            let mut st = self.lock();
            st.epoch += 1;
            st.loading = false;
            match outcome {
                Ok(()) => Ok(()),
                Err(err) => {
                    st.error = Some(SIGNUP_FAILED_MSG.to_string());
                    Err(SessionError::SignupFailed(err))
                }
            }
        };
        self.arm_login_prompt();
        result
    }

    /// End the session. Local identity is cleared whatever the remote call
    /// does — a stuck session is worse than a falsely-cleared one. A remote
    /// failure only leaves a non-fatal informational message.
    pub async fn logout(&self) {
        {
            let mut st = self.lock();
            st.epoch += 1;
            st.error = None;
            st.loading = true;
        }

        let outcome = self.inner.auth.logout().await;

        {
            let mut st = self.lock();
            st.epoch += 1;
            st.phase = AuthPhase::Anonymous { prompting: false };
            st.loading = false;
            if let Err(err) = outcome {
                tracing::warn!(error = %err, "remote logout failed; session cleared locally");
                st.error = Some(LOGOUT_FAILED_MSG.to_string());
            }
        }
        self.arm_login_prompt();
    }

    /// Hide the login interstitial. Does not re-arm the timer; a dismissed
    /// prompt stays dismissed until some operation changes the state.
    pub fn dismiss_login_prompt(&self) {
        let mut st = self.lock();
        st.epoch += 1;
        if let AuthPhase::Anonymous { prompting } = &mut st.phase {
            *prompting = false;
        }
    }

    // ── Internals ─────────────────────────────────────────────────────

    /// Post-login identity probe with a bounded backoff schedule. Leaves the
    /// session anonymous when every attempt comes back empty; the login
    /// itself still counts as resolved.
    async fn resolve_identity_with_backoff(&self) {
        let backoff = self.inner.identity_probe;
        for attempt in 0..backoff.attempts {
            tokio::time::sleep(backoff.delay_for(attempt)).await;
            match self.inner.auth.check_session().await {
                Ok(probe) => {
                    let resolved = probe
                        .user
                        .or_else(|| (!probe.tasks.is_empty()).then(User::placeholder));
                    if let Some(user) = resolved {
                        let mut st = self.lock();
                        st.epoch += 1;
                        st.phase = AuthPhase::Authenticated(user);
                        return;
                    }
                }
                Err(err) => {
                    tracing::debug!(attempt, error = %err, "post-login identity probe failed");
                }
            }
        }
        tracing::warn!("identity unresolved after login; session remains anonymous");
    }

    /// Arm the one-shot login-prompt timer when the current state qualifies:
    /// dashboard route, check done, no user, nothing loading, not already
    /// prompting. Any state mutation before the delay elapses cancels it,
    /// and the conditions are re-validated at fire time.
    fn arm_login_prompt(&self) {
        let armed_epoch = {
            let st = self.lock();
            if !st.qualifies_for_prompt() {
                return;
            }
            st.epoch
        };

        let session = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(session.inner.prompt_delay).await;
            let mut st = session.lock();
            if st.epoch != armed_epoch || !st.qualifies_for_prompt() {
                return;
            }
            st.epoch += 1;
            if let AuthPhase::Anonymous { prompting } = &mut st.phase {
                *prompting = true;
            }
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::SessionProbe;
    use crate::errors::ApiError;
    use crate::model::{Category, Priority, Task, TaskStatus};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Auth gateway double fed a script of probe/login outcomes.
    #[derive(Default)]
    struct ScriptedAuth {
        probes: Mutex<VecDeque<Result<SessionProbe, ApiError>>>,
        logins: Mutex<VecDeque<Result<Option<User>, ApiError>>>,
        logout_fails: bool,
        signup_fails: bool,
        probe_calls: AtomicUsize,
    }

    impl ScriptedAuth {
        fn push_probe(&self, outcome: Result<SessionProbe, ApiError>) {
            self.probes.lock().unwrap().push_back(outcome);
        }

        fn push_login(&self, outcome: Result<Option<User>, ApiError>) {
            self.logins.lock().unwrap().push_back(outcome);
        }

        fn probe_count(&self) -> usize {
            self.probe_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthApi for ScriptedAuth {
        async fn signup(&self, _profile: &SignupProfile) -> Result<(), ApiError> {
            if self.signup_fails {
                Err(ApiError::Status { status: 500 })
            } else {
                Ok(())
            }
        }

        async fn login(&self, _credentials: &Credentials) -> Result<Option<User>, ApiError> {
            self.logins
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ApiError::Status { status: 401 }))
        }

        async fn logout(&self) -> Result<(), ApiError> {
            if self.logout_fails {
                Err(ApiError::Status { status: 500 })
            } else {
                Ok(())
            }
        }

        async fn check_session(&self) -> Result<SessionProbe, ApiError> {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
            self.probes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ApiError::Status { status: 401 }))
        }
    }

    fn fast_config() -> ClientConfig {
        let mut cfg = ClientConfig::default();
        cfg.login_prompt_delay = Duration::from_millis(25);
        cfg.identity_probe = ProbeBackoff {
            attempts: 3,
            initial_delay: Duration::from_millis(5),
            multiplier: 1,
        };
        cfg
    }

    fn session_with(auth: ScriptedAuth) -> (Session, Arc<ScriptedAuth>) {
        let auth = Arc::new(auth);
        (Session::new(auth.clone(), &fast_config()), auth)
    }

    fn some_user() -> User {
        User {
            id: 7,
            name: "Mina".to_string(),
            email: "mina@example.com".to_string(),
        }
    }

    fn sample_task() -> Task {
        Task {
            id: 1,
            name: "buy milk".to_string(),
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            due_date: NaiveDate::from_ymd_opt(2026, 8, 23).unwrap(),
            category: Category::General,
            created_at: None,
        }
    }

    /// The core invariant: the prompt never shows while initializing or
    /// while a user is set.
    fn assert_invariant(snap: &SessionSnapshot) {
        if snap.show_login_prompt() {
            assert!(snap.has_checked_auth());
            assert!(!snap.is_initializing());
            assert!(snap.user().is_none());
        }
    }

    #[tokio::test]
    async fn initialize_on_public_route_skips_probe() {
        let (session, auth) = session_with(ScriptedAuth::default());
        session.initialize(Route::Public).await;

        let snap = session.snapshot();
        assert!(!snap.is_initializing());
        assert!(snap.has_checked_auth());
        assert!(!snap.is_authenticated());
        assert_eq!(auth.probe_count(), 0);
    }

    #[tokio::test]
    async fn initialize_on_dashboard_probes_and_authenticates() {
        let auth = ScriptedAuth::default();
        auth.push_probe(Ok(SessionProbe {
            user: Some(some_user()),
            tasks: vec![],
        }));
        let (session, auth) = session_with(auth);
        session.initialize(Route::Dashboard).await;

        let snap = session.snapshot();
        assert!(!snap.is_initializing());
        assert_eq!(snap.user().map(|u| u.id), Some(7));
        assert_eq!(auth.probe_count(), 1);
    }

    #[tokio::test]
    async fn probe_failure_leaves_initializing_and_swallows_error() {
        let auth = ScriptedAuth::default();
        auth.push_probe(Err(ApiError::Status { status: 401 }));
        let (session, _auth) = session_with(auth);
        session.initialize(Route::Dashboard).await;

        let snap = session.snapshot();
        assert!(!snap.is_initializing());
        assert!(snap.has_checked_auth());
        assert!(snap.user().is_none());
        assert!(snap.error.is_none());
        assert!(!snap.is_loading);
    }

    #[tokio::test]
    async fn probe_with_tasks_but_no_user_synthesizes_placeholder() {
        let auth = ScriptedAuth::default();
        auth.push_probe(Ok(SessionProbe {
            user: None,
            tasks: vec![sample_task()],
        }));
        let (session, _auth) = session_with(auth);
        session.initialize(Route::Dashboard).await;

        let snap = session.snapshot();
        let user = snap.user().expect("placeholder identity expected");
        assert_eq!(user.id, 0);
        assert!(user.email.is_empty());
    }

    #[tokio::test]
    async fn probe_with_empty_tasks_and_no_user_stays_anonymous() {
        let auth = ScriptedAuth::default();
        auth.push_probe(Ok(SessionProbe::default()));
        let (session, _auth) = session_with(auth);
        session.initialize(Route::Dashboard).await;
        assert!(!session.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn initialize_runs_only_once() {
        let auth = ScriptedAuth::default();
        auth.push_probe(Err(ApiError::Status { status: 401 }));
        auth.push_probe(Ok(SessionProbe {
            user: Some(some_user()),
            tasks: vec![],
        }));
        let (session, auth) = session_with(auth);
        session.initialize(Route::Dashboard).await;
        session.initialize(Route::Dashboard).await;

        // Second call is ignored; the scripted success probe was never used
        assert_eq!(auth.probe_count(), 1);
        assert!(!session.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn login_with_user_in_response_authenticates_without_probe() {
        let auth = ScriptedAuth::default();
        auth.push_login(Ok(Some(some_user())));
        let (session, auth) = session_with(auth);
        session.initialize(Route::Public).await;

        let creds = Credentials {
            email: "mina@example.com".to_string(),
            password: "pw".to_string(),
        };
        session.login(&creds).await.unwrap();

        let snap = session.snapshot();
        assert_eq!(snap.user().map(|u| u.name.as_str()), Some("Mina"));
        assert!(!snap.is_loading);
        assert_eq!(auth.probe_count(), 0);
    }

    #[tokio::test]
    async fn login_without_identity_resolves_on_later_probe() {
        let auth = ScriptedAuth::default();
        auth.push_login(Ok(None));
        // First probe still sees nothing, second resolves
        auth.push_probe(Ok(SessionProbe::default()));
        auth.push_probe(Ok(SessionProbe {
            user: Some(some_user()),
            tasks: vec![],
        }));
        let (session, auth) = session_with(auth);
        session.initialize(Route::Public).await;

        let creds = Credentials {
            email: "mina@example.com".to_string(),
            password: "pw".to_string(),
        };
        session.login(&creds).await.unwrap();

        assert!(session.snapshot().is_authenticated());
        assert_eq!(auth.probe_count(), 2);
    }

    #[tokio::test]
    async fn login_identity_probe_gives_up_after_bounded_attempts() {
        let auth = ScriptedAuth::default();
        auth.push_login(Ok(None));
        let (session, auth) = session_with(auth);
        session.initialize(Route::Public).await;

        let creds = Credentials {
            email: "a@b.c".to_string(),
            password: "pw".to_string(),
        };
        // Every probe fails; login itself still resolves
        session.login(&creds).await.unwrap();

        let snap = session.snapshot();
        assert!(!snap.is_authenticated());
        assert!(!snap.is_loading);
        assert_eq!(auth.probe_count(), 3);
    }

    #[tokio::test]
    async fn login_failure_sets_message_and_reraises() {
        let auth = ScriptedAuth::default();
        auth.push_login(Err(ApiError::Status { status: 401 }));
        let (session, _auth) = session_with(auth);
        session.initialize(Route::Public).await;

        let creds = Credentials {
            email: "a@b.c".to_string(),
            password: "wrong".to_string(),
        };
        let err = session.login(&creds).await.unwrap_err();
        assert!(matches!(err, SessionError::LoginFailed(_)));

        let snap = session.snapshot();
        assert_eq!(
            snap.error.as_deref(),
            Some("Login failed. Please check your credentials.")
        );
        assert!(!snap.is_loading);
        assert!(!snap.is_authenticated());
    }

    #[tokio::test]
    async fn signup_never_establishes_a_session() {
        let (session, _auth) = session_with(ScriptedAuth::default());
        session.initialize(Route::Public).await;

        let profile = SignupProfile {
            name: "Mina".to_string(),
            email: "mina@example.com".to_string(),
            password: "pw".to_string(),
        };
        session.signup(&profile).await.unwrap();
        assert!(!session.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn signup_failure_sets_message_and_reraises() {
        let auth = ScriptedAuth {
            signup_fails: true,
            ..Default::default()
        };
        let (session, _auth) = session_with(auth);
        session.initialize(Route::Public).await;

        let profile = SignupProfile {
            name: "x".to_string(),
            email: "x@y.z".to_string(),
            password: "pw".to_string(),
        };
        let err = session.signup(&profile).await.unwrap_err();
        assert!(matches!(err, SessionError::SignupFailed(_)));
        assert_eq!(
            session.snapshot().error.as_deref(),
            Some("Signup failed. Please try again.")
        );
    }

    #[tokio::test]
    async fn failed_remote_logout_still_clears_identity() {
        let auth = ScriptedAuth {
            logout_fails: true,
            ..Default::default()
        };
        auth.push_login(Ok(Some(some_user())));
        let (session, _auth) = session_with(auth);
        session.initialize(Route::Public).await;
        session
            .login(&Credentials {
                email: "a@b.c".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();
        assert!(session.snapshot().is_authenticated());

        session.logout().await;

        let snap = session.snapshot();
        assert!(snap.user().is_none());
        assert!(!snap.show_login_prompt());
        assert_eq!(
            snap.error.as_deref(),
            Some("Logout failed, but you have been logged out locally.")
        );
        assert_invariant(&snap);
    }

    #[tokio::test]
    async fn prompt_arms_and_fires_on_idle_anonymous_dashboard() {
        let auth = ScriptedAuth::default();
        auth.push_probe(Err(ApiError::Status { status: 401 }));
        let (session, _auth) = session_with(auth);
        session.initialize(Route::Dashboard).await;
        assert!(!session.snapshot().show_login_prompt());

        tokio::time::sleep(Duration::from_millis(80)).await;
        let snap = session.snapshot();
        assert!(snap.show_login_prompt());
        assert_invariant(&snap);
    }

    #[tokio::test]
    async fn prompt_never_arms_on_public_route() {
        let (session, _auth) = session_with(ScriptedAuth::default());
        session.initialize(Route::Public).await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!session.snapshot().show_login_prompt());
    }

    #[tokio::test]
    async fn prompt_timer_cancelled_by_login_before_fire() {
        let auth = ScriptedAuth::default();
        auth.push_probe(Err(ApiError::Status { status: 401 }));
        auth.push_login(Ok(Some(some_user())));
        let (session, _auth) = session_with(auth);
        session.initialize(Route::Dashboard).await;

        // Log in before the 25ms prompt delay elapses
        session
            .login(&Credentials {
                email: "a@b.c".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        let snap = session.snapshot();
        assert!(snap.is_authenticated());
        assert!(!snap.show_login_prompt());
        assert_invariant(&snap);
    }

    #[tokio::test]
    async fn dismissed_prompt_stays_dismissed() {
        let auth = ScriptedAuth::default();
        auth.push_probe(Err(ApiError::Status { status: 401 }));
        let (session, _auth) = session_with(auth);
        session.initialize(Route::Dashboard).await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(session.snapshot().show_login_prompt());

        session.dismiss_login_prompt();
        assert!(!session.snapshot().show_login_prompt());

        // Dismissing does not re-arm the timer
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!session.snapshot().show_login_prompt());
    }
}
