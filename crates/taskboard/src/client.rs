//! `TaskboardClient` builder and session operations.
//!
//! This is the entry point for talking to a Taskboard API. It ties the
//! layers together: transport → dispatcher → session guard, with the
//! session store underneath and the refresh scheduler listening to it.

use std::sync::Arc;

use taskboard_dispatch::{Failure, GuardState, RequestDispatcher, SessionGuard};
use taskboard_protocol::{
    ApiResponse, AuthPayload, Credentials, RequestSpec, SignupRequest,
};
use taskboard_refresh::RefreshScheduler;
use taskboard_session::{
    FileTokenStorage, MemoryTokenStorage, Session, SessionEvent, SessionStore,
    Subscription, TokenStorage,
};
use taskboard_transport::{HttpTransport, ReqwestTransport};
use tracing::{info, warn};

use crate::{ClientConfig, TaskboardError};

pub const LOGIN_PATH: &str = "/auth/login";
pub const SIGNUP_PATH: &str = "/auth/signup";
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Builder for a [`TaskboardClient`].
///
/// # Example
///
/// ```rust,ignore
/// let client = TaskboardClient::builder()
///     .config(ClientConfig::from_env()?)
///     .build()?;
/// client.login(Credentials::new("ada@example.com", "secret")).await?;
/// let boards = client.list_boards().await?;
/// ```
#[derive(Default)]
pub struct TaskboardClientBuilder {
    config: ClientConfig,
    storage: Option<Arc<dyn TokenStorage>>,
}

impl TaskboardClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides where the token is persisted. Without this the client
    /// uses `config.token_file`, or memory if that is unset.
    pub fn storage(mut self, storage: impl TokenStorage) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Builds a client over `reqwest`.
    pub fn build(self) -> Result<TaskboardClient<ReqwestTransport>, TaskboardError> {
        self.build_with_transport(ReqwestTransport::new())
    }

    /// Builds a client over any transport.
    ///
    /// Call from inside a Tokio runtime so a restored session gets its
    /// proactive refresh armed.
    pub fn build_with_transport<T: HttpTransport>(
        self,
        transport: T,
    ) -> Result<TaskboardClient<T>, TaskboardError> {
        self.config.validate()?;

        let storage = match (self.storage, &self.config.token_file) {
            (Some(storage), _) => storage,
            (None, Some(path)) => Arc::new(FileTokenStorage::new(path.clone())),
            (None, None) => Arc::new(MemoryTokenStorage::new()),
        };
        let store = Arc::new(SessionStore::restore_shared(storage));

        let dispatcher = RequestDispatcher::new(
            transport,
            Arc::clone(&store),
            self.config.dispatch_config(),
        );
        let guard = Arc::new(SessionGuard::new(dispatcher, Arc::clone(&store)));
        let scheduler = Arc::new(RefreshScheduler::new(
            self.config.refresh,
            Arc::downgrade(&guard),
        ));
        let scheduler_subscription = scheduler.bind(&store);

        info!(base_url = %self.config.base_url, "taskboard client ready");
        Ok(TaskboardClient {
            guard,
            store,
            scheduler,
            scheduler_subscription: Some(scheduler_subscription),
            config: self.config,
        })
    }
}

/// A session-aware Taskboard API client.
///
/// Every request goes through [`dispatch`](Self::dispatch): the bearer
/// token is attached, transient failures are retried, and an expired
/// session is refreshed once for however many requests noticed it. The
/// typed board/task/suggestion helpers are thin wrappers over it.
pub struct TaskboardClient<T: HttpTransport = ReqwestTransport> {
    guard: Arc<SessionGuard<T>>,
    store: Arc<SessionStore>,
    scheduler: Arc<RefreshScheduler<SessionGuard<T>>>,
    scheduler_subscription: Option<Subscription>,
    config: ClientConfig,
}

impl TaskboardClient<ReqwestTransport> {
    pub fn builder() -> TaskboardClientBuilder {
        TaskboardClientBuilder::new()
    }

    /// A `reqwest` client for `config`.
    pub fn new(config: ClientConfig) -> Result<Self, TaskboardError> {
        Self::builder().config(config).build()
    }
}

impl<T: HttpTransport> TaskboardClient<T> {
    // ---------------------------------------------------------------------
    // Requests
    // ---------------------------------------------------------------------

    /// Sends one logical request. The only way anything reaches the API.
    pub async fn dispatch(&self, spec: RequestSpec) -> Result<ApiResponse, Failure> {
        self.guard.dispatch(spec).await
    }

    // ---------------------------------------------------------------------
    // Session
    // ---------------------------------------------------------------------

    /// Signs in and replaces the session.
    pub async fn login(&self, credentials: Credentials) -> Result<Arc<Session>, TaskboardError> {
        let spec = RequestSpec::post(LOGIN_PATH).json(&credentials)?;
        self.authenticate(spec).await
    }

    /// Creates an account and signs in as it.
    pub async fn signup(&self, request: SignupRequest) -> Result<Arc<Session>, TaskboardError> {
        let spec = RequestSpec::post(SIGNUP_PATH).json(&request)?;
        self.authenticate(spec).await
    }

    async fn authenticate(&self, spec: RequestSpec) -> Result<Arc<Session>, TaskboardError> {
        let response = self.dispatch(spec).await?;
        let payload: AuthPayload = response.json()?;
        let token = payload.require_token()?;
        let session = self
            .store
            .set_session(Session::authenticated(token, payload.user.clone()));
        info!(user_id = ?session.user().map(|u| u.id.to_string()), "signed in");
        Ok(session)
    }

    /// Signs out.
    ///
    /// The server is told when there is a session to end, best effort:
    /// a failed call is logged and the local session is cleared anyway.
    /// Calling it when already signed out just clears again.
    pub async fn logout(&self) {
        if self.store.session().is_authenticated() {
            if let Err(e) = self.dispatch(RequestSpec::post(LOGOUT_PATH)).await {
                warn!(kind = %e.kind, "server logout failed; clearing local session");
            }
        }
        self.store.clear();
        info!("signed out");
    }

    /// Refreshes the session now, or joins a refresh already running.
    pub async fn refresh(&self) -> Result<Arc<Session>, Failure> {
        self.guard.refresh().await
    }

    /// The current session snapshot.
    pub fn session(&self) -> Arc<Session> {
        self.store.session()
    }

    /// Calls `listener` with `{ authenticated, user }` on every session
    /// change (login, refresh, logout, forced logout).
    pub fn subscribe(
        &self,
        listener: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.store.subscribe(move |session| listener(&session.event()))
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn guard_state(&self) -> GuardState {
        self.guard.state()
    }

    /// Refresh calls made so far, proactive and reactive.
    pub fn refresh_count(&self) -> u64 {
        self.guard.refresh_count()
    }

    /// Whether a proactive refresh is scheduled.
    pub fn is_refresh_scheduled(&self) -> bool {
        self.scheduler.is_armed()
    }

    pub fn transport(&self) -> &T {
        self.guard.dispatcher().transport()
    }
}

impl<T: HttpTransport> Drop for TaskboardClient<T> {
    fn drop(&mut self) {
        // Detach the scheduler from the store; dropping it cancels its timer.
        if let Some(subscription) = self.scheduler_subscription.take() {
            subscription.unsubscribe();
        }
    }
}
