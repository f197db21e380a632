//! The session guard: turns a 401 into at most one token refresh.
//!
//! # State machine
//!
//! ```text
//!            401, not yet replayed
//!   Idle ─────────────────────────────▶ Refreshing { queue }
//!    ▲                                       │
//!    │  refresh settled: session replaced    │  more 401s append
//!    │  (or cleared), queue drained in FIFO  │  to the queue
//!    └───────────────────────────────────────┘
//! ```
//!
//! The decision "start a refresh or join the running one" is made under
//! a `std::sync::Mutex` that is never held across an `.await`, so it is
//! atomic on any Tokio runtime. The refresh call itself runs on its own
//! task; callers only hold the receiving end of a oneshot, so dropping a
//! caller never cancels the refresh the others are waiting on.
//!
//! The same task drains the queue. Queued requests are replayed from
//! there, started in queue order, and each caller gets its replay's
//! outcome back through its oneshot.
//!
//! A refresh only lands if the session still holds the token it started
//! from. A logout or login that happens while the refresh is in flight
//! wins, and the refresh result is dropped.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::join_all;
use taskboard_protocol::{ApiResponse, AuthPayload, RequestSpec};
use taskboard_refresh::RefreshTrigger;
use taskboard_session::{Session, SessionStore};
use taskboard_transport::HttpTransport;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::{Failure, FailureKind, RequestDispatcher};

/// Path of the refresh endpoint.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Observable guard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Idle,
    Refreshing,
}

/// A caller parked until the in-flight refresh settles.
enum Waiter {
    /// A `refresh()` caller; only wants the outcome.
    Refresh(oneshot::Sender<Result<(), Failure>>),
    /// A request that hit a 401. Replayed by the drain on success.
    Replay {
        spec: RequestSpec,
        tx: oneshot::Sender<Result<ApiResponse, Failure>>,
    },
}

enum Phase {
    Idle,
    Refreshing { queue: VecDeque<Waiter> },
}

/// What a 401'd request should do next.
enum Retry {
    /// Queued behind the in-flight refresh; the drain replays it.
    Queued(oneshot::Receiver<Result<ApiResponse, Failure>>),
    /// The session moved to another token since this request was sent;
    /// replay now without refreshing again.
    Now(RequestSpec),
    /// The session ended since this request was sent.
    SignedOut,
}

struct Inner<T: HttpTransport> {
    dispatcher: RequestDispatcher<T>,
    store: Arc<SessionStore>,
    phase: Mutex<Phase>,
    refresh_count: AtomicU64,
}

/// Dispatches requests and absorbs auth failures by refreshing the
/// session once, however many requests hit the 401.
pub struct SessionGuard<T: HttpTransport> {
    inner: Arc<Inner<T>>,
}

impl<T: HttpTransport> Clone for SessionGuard<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: HttpTransport> SessionGuard<T> {
    pub fn new(dispatcher: RequestDispatcher<T>, store: Arc<SessionStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                dispatcher,
                store,
                phase: Mutex::new(Phase::Idle),
                refresh_count: AtomicU64::new(0),
            }),
        }
    }

    pub fn dispatcher(&self) -> &RequestDispatcher<T> {
        &self.inner.dispatcher
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.inner.store
    }

    pub fn state(&self) -> GuardState {
        match *self.inner.lock_phase() {
            Phase::Idle => GuardState::Idle,
            Phase::Refreshing { .. } => GuardState::Refreshing,
        }
    }

    /// Number of refresh calls made so far.
    pub fn refresh_count(&self) -> u64 {
        self.inner.refresh_count.load(Ordering::Acquire)
    }

    /// Sends `spec`, refreshing and replaying once on a 401.
    ///
    /// A 401 is final when the request was already replayed or targets an
    /// `/auth/` endpoint. When the refresh fails, or the session ends
    /// while the request is out, every waiting caller gets
    /// [`FailureKind::RefreshFailed`] and nothing is replayed.
    pub async fn dispatch(&self, spec: RequestSpec) -> Result<ApiResponse, Failure> {
        let session = self.inner.store.session();
        let failure = match self.inner.dispatcher.send_as(&spec, &session).await {
            Err(f) if f.kind == FailureKind::AuthFailure => f,
            outcome => return outcome,
        };
        if spec.auth_retried || spec.is_auth_endpoint() {
            return Err(failure);
        }

        debug!(path = %spec.path, "auth failure; waiting for session refresh");
        match self.admit_retry(spec.into_auth_retried(), session.token()) {
            Retry::Queued(rx) => settled(rx).await,
            Retry::Now(spec) => {
                debug!("session already refreshed; replaying");
                self.inner.dispatcher.send(&spec).await
            }
            Retry::SignedOut => {
                debug!("session ended; not replaying");
                Err(Failure::new(
                    FailureKind::RefreshFailed,
                    "session ended before the request could be replayed",
                ))
            }
        }
    }

    /// Refreshes the session now, or joins the refresh already running.
    ///
    /// Returns the session the refresh produced.
    pub async fn refresh(&self) -> Result<Arc<Session>, Failure> {
        let (tx, rx) = oneshot::channel();
        {
            let mut phase = self.inner.lock_phase();
            self.enqueue(&mut phase, Waiter::Refresh(tx));
        }
        settled(rx).await?;
        Ok(self.inner.store.session())
    }

    /// Queues a 401'd request behind the refresh, starting one if needed.
    ///
    /// `sent_with` is the token the request carried. If the guard is idle
    /// and the session no longer holds that token, a refresh or a new
    /// login already happened (replay with the new token) or the session
    /// ended (don't replay at all). Starting another refresh would only
    /// burn the new token.
    fn admit_retry(&self, spec: RequestSpec, sent_with: Option<&str>) -> Retry {
        let mut phase = self.inner.lock_phase();
        if let Phase::Idle = *phase {
            let current = self.inner.store.session();
            if current.token() != sent_with {
                return match current.token() {
                    Some(_) => Retry::Now(spec),
                    None => Retry::SignedOut,
                };
            }
        }
        let (tx, rx) = oneshot::channel();
        self.enqueue(&mut phase, Waiter::Replay { spec, tx });
        Retry::Queued(rx)
    }

    /// Appends `waiter` to the queue, spawning the refresh when idle.
    fn enqueue(&self, phase: &mut Phase, waiter: Waiter) {
        match &mut *phase {
            Phase::Refreshing { queue } => {
                queue.push_back(waiter);
                debug!(queued = queue.len(), "joined in-flight refresh");
            }
            Phase::Idle => {
                *phase = Phase::Refreshing {
                    queue: VecDeque::from([waiter]),
                };
                let started_from = self.inner.store.session();
                tokio::spawn(Arc::clone(&self.inner).run_refresh(started_from));
            }
        }
    }
}

async fn settled<R>(rx: oneshot::Receiver<Result<R, Failure>>) -> Result<R, Failure> {
    rx.await.unwrap_or_else(|_| {
        Err(Failure::new(
            FailureKind::RefreshFailed,
            "session refresh was abandoned",
        ))
    })
}

impl<T: HttpTransport> Inner<T> {
    fn lock_phase(&self) -> std::sync::MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The one refresh code path. Runs on its own task.
    ///
    /// `started_from` is the session when the refresh was requested; the
    /// result only lands if the store still holds its token.
    async fn run_refresh(self: Arc<Self>, started_from: Arc<Session>) {
        let n = self.refresh_count.fetch_add(1, Ordering::AcqRel) + 1;
        info!(refresh = n, "refreshing session");

        let outcome = match self.call_refresh(&started_from).await {
            // Listeners (the scheduler among them) run before this returns.
            Ok(session) => match self.store.replace_if_token(started_from.token(), session) {
                Ok(_) => {
                    info!(refresh = n, "session refreshed");
                    Ok(())
                }
                Err(current) => superseded(n, &current),
            },
            Err(e) => {
                match self
                    .store
                    .replace_if_token(started_from.token(), Session::anonymous())
                {
                    Ok(_) => warn!(refresh = n, kind = %e.kind, "session refresh failed; signing out"),
                    Err(_) => warn!(refresh = n, kind = %e.kind, "session refresh failed; session already replaced"),
                }
                Err(Failure::refresh_failed(&e))
            }
        };

        let waiters = match std::mem::replace(&mut *self.lock_phase(), Phase::Idle) {
            Phase::Refreshing { queue } => queue,
            Phase::Idle => VecDeque::new(),
        };
        debug!(released = waiters.len(), "draining refresh queue");

        let mut replays = Vec::new();
        for waiter in waiters {
            match (waiter, &outcome) {
                // A caller that gave up dropped its receiver; send fails quietly.
                (Waiter::Refresh(tx), outcome) => {
                    let _ = tx.send(outcome.clone());
                }
                (Waiter::Replay { tx, .. }, Err(failure)) => {
                    let _ = tx.send(Err(failure.clone()));
                }
                (Waiter::Replay { tx, .. }, Ok(())) if tx.is_closed() => {}
                (Waiter::Replay { spec, tx }, Ok(())) => {
                    let dispatcher = &self.dispatcher;
                    replays.push(async move {
                        let _ = tx.send(dispatcher.send(&spec).await);
                    });
                }
            }
        }
        // First poll runs in push order, so replays go out in queue order.
        join_all(replays).await;
    }

    async fn call_refresh(&self, current: &Session) -> Result<Session, Failure> {
        let response = self
            .dispatcher
            .send_as(&RequestSpec::post(REFRESH_PATH), current)
            .await?;
        let payload: AuthPayload = response.json()?;
        let token = payload.require_token()?;
        // Refresh may omit the user; keep the one we had.
        let user = payload.user.clone().or_else(|| current.user().cloned());
        Ok(Session::authenticated(token, user))
    }
}

/// Outcome for waiters when the session changed while refreshing.
fn superseded(n: u64, current: &Session) -> Result<(), Failure> {
    if current.is_authenticated() {
        info!(refresh = n, "session replaced during refresh; keeping the newer one");
        Ok(())
    } else {
        info!(refresh = n, "signed out during refresh; dropping the result");
        Err(Failure::new(
            FailureKind::RefreshFailed,
            "signed out while the session was refreshing",
        ))
    }
}

impl<T: HttpTransport> RefreshTrigger for SessionGuard<T> {
    async fn refresh(&self) {
        if let Err(e) = SessionGuard::refresh(self).await {
            debug!(error = %e, "proactive refresh did not succeed");
        }
    }
}
