//! Proactive session refresh for Taskboard.
//!
//! Renews the session shortly before its token expires, so requests
//! don't have to hit a 401 first. The scheduler arms a single one-shot
//! timer per session; every session change cancels it and arms a new
//! one (or none, when signed out or when the token's expiry can't be
//! read).
//!
//! # Integration
//!
//! The scheduler is driven purely by session-change events. Bind it to
//! the store once and it follows every login, refresh, and logout:
//!
//! ```ignore
//! let scheduler = Arc::new(RefreshScheduler::new(config, Arc::downgrade(&guard)));
//! let subscription = scheduler.bind(&store);
//! ```
//!
//! The refresh itself is whatever [`RefreshTrigger`] does: in practice
//! the same single-flight entry point the dispatcher uses after a 401,
//! so a timer firing during a reactive refresh joins it instead of
//! starting a second one.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use taskboard_session::{Session, SessionStore, Subscription};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// When to refresh, relative to token expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshConfig {
    /// How long before expiry to refresh. Default: 60 s.
    pub lead: Duration,
    /// Floor on the computed delay, so an already-expiring token doesn't
    /// trigger a refresh storm. Default: 1 s.
    pub min_delay: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            lead: Self::DEFAULT_LEAD,
            min_delay: Self::DEFAULT_MIN_DELAY,
        }
    }
}

impl RefreshConfig {
    pub const DEFAULT_LEAD: Duration = Duration::from_secs(60);
    pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);

    /// `max(expires_at - now - lead, min_delay)`, all in epoch millis.
    pub fn delay_until_refresh(&self, expires_at_ms: u64, now_ms: u64) -> Duration {
        let remaining = expires_at_ms
            .saturating_sub(now_ms)
            .saturating_sub(self.lead.as_millis() as u64);
        Duration::from_millis(remaining).max(self.min_delay)
    }
}

/// Wall-clock now in epoch milliseconds. Token expiry is wall-clock
/// time, so this (not a monotonic clock) is what it's compared against.
pub fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// The refresh entry point the timer calls when it elapses.
///
/// Implementations must be single-flight: calling `refresh` while a
/// refresh is already running should join it, not start another.
pub trait RefreshTrigger: Send + Sync + 'static {
    fn refresh(&self) -> impl Future<Output = ()> + Send;
}

// ---------------------------------------------------------------------------
// Timer handle
// ---------------------------------------------------------------------------

/// The one armed timer.
///
/// Once the deadline has passed the handle counts as *fired*: the task
/// may still be running the refresh, and cancelling must not abort it
/// mid-flight (the refresh itself updates the session, which is what
/// causes the cancel).
#[derive(Debug)]
pub struct RefreshTimerHandle {
    task: JoinHandle<()>,
    deadline: TokioInstant,
    fired: Arc<AtomicBool>,
}

impl RefreshTimerHandle {
    /// When the timer fires (Tokio clock).
    pub fn deadline(&self) -> TokioInstant {
        self.deadline
    }

    /// `true` while the timer is still waiting for its deadline.
    pub fn is_pending(&self) -> bool {
        !self.fired.load(Ordering::Acquire) && !self.task.is_finished()
    }

    fn cancel(self) {
        if self.fired.load(Ordering::Acquire) {
            // Already running the refresh; let it finish detached.
            return;
        }
        self.task.abort();
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Arms, cancels, and re-arms the proactive refresh timer.
///
/// Holds the trigger weakly: the trigger (the session guard) owns the
/// store, and the store owns the scheduler's listener, so a strong
/// reference here would be a cycle that keeps everything alive forever.
pub struct RefreshScheduler<T: RefreshTrigger> {
    config: RefreshConfig,
    trigger: Weak<T>,
    timer: Mutex<Option<RefreshTimerHandle>>,
}

impl<T: RefreshTrigger> RefreshScheduler<T> {
    pub fn new(config: RefreshConfig, trigger: Weak<T>) -> Self {
        debug!(
            lead_ms = config.lead.as_millis() as u64,
            min_delay_ms = config.min_delay.as_millis() as u64,
            "refresh scheduler created"
        );
        Self {
            config,
            trigger,
            timer: Mutex::new(None),
        }
    }

    /// Subscribes to `store` and arms for its current session right away
    /// (a session restored from storage needs a timer too).
    pub fn bind(self: &Arc<Self>, store: &SessionStore) -> Subscription {
        self.on_session_changed(&store.session());
        let scheduler = Arc::clone(self);
        store.subscribe(move |session| scheduler.on_session_changed(session))
    }

    /// Cancels any armed timer, then arms a new one if `session` is
    /// authenticated and its expiry is known.
    ///
    /// Must be called from within a Tokio runtime to arm; outside one it
    /// logs a warning and leaves no timer (reactive refresh still works).
    pub fn on_session_changed(&self, session: &Session) {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = timer.take() {
            debug!("refresh timer cancelled");
            old.cancel();
        }

        if !session.is_authenticated() {
            return;
        }
        let Some(claims) = session.claims() else {
            debug!("token expiry unknown; no proactive refresh");
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no Tokio runtime; proactive refresh not armed");
            return;
        };

        let delay = self
            .config
            .delay_until_refresh(claims.expires_at_ms, now_epoch_ms());
        let deadline = TokioInstant::now() + delay;
        let fired = Arc::new(AtomicBool::new(false));

        let trigger = self.trigger.clone();
        let fired_in_task = Arc::clone(&fired);
        let task = runtime.spawn(async move {
            time::sleep_until(deadline).await;
            fired_in_task.store(true, Ordering::Release);
            match trigger.upgrade() {
                Some(trigger) => {
                    info!("proactive session refresh");
                    trigger.refresh().await;
                }
                None => debug!("refresh trigger dropped; timer idle"),
            }
        });

        debug!(delay_ms = delay.as_millis() as u64, "refresh timer armed");
        *timer = Some(RefreshTimerHandle {
            task,
            deadline,
            fired,
        });
    }

    /// Cancels the armed timer. A no-op when none is armed.
    pub fn cancel(&self) {
        if let Some(old) = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            debug!("refresh timer cancelled");
            old.cancel();
        }
    }

    /// Whether a timer is armed and still waiting.
    pub fn is_armed(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(RefreshTimerHandle::is_pending)
    }

    /// Deadline of the armed timer, if one is waiting.
    pub fn deadline(&self) -> Option<TokioInstant> {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|h| h.is_pending())
            .map(RefreshTimerHandle::deadline)
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }
}

impl<T: RefreshTrigger> Drop for RefreshScheduler<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
