//! The session store: the single owner of the current [`Session`].
//!
//! Every other component either reads a snapshot ([`SessionStore::session`])
//! or subscribes to changes ([`SessionStore::subscribe`]). Only the store
//! can replace the session, and it only ever replaces it wholesale.
//!
//! # Locking
//!
//! Three locks, never held across an `.await` (nothing in here is async):
//!
//! - `write_gate` serializes writers, so persist → swap → notify runs as
//!   one unit per update and listeners see updates in the order they
//!   were made.
//! - `current` guards the snapshot pointer. Readers hold it only long
//!   enough to clone an `Arc`.
//! - `listeners` guards the subscriber list. It is cloned out before
//!   listeners run, so a listener may read the session or subscribe
//!   without deadlocking.
//!
//! Listeners must not call [`SessionStore::set_session`] or
//! [`SessionStore::clear`] from inside the callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use crate::{MemoryTokenStorage, Session, TokenStorage};

type Listener = Arc<dyn Fn(&Session) + Send + Sync>;
type ListenerList = Mutex<Vec<(u64, Listener)>>;

/// Owns the current session and notifies subscribers when it changes.
pub struct SessionStore {
    current: RwLock<Arc<Session>>,
    listeners: Arc<ListenerList>,
    write_gate: Mutex<()>,
    next_listener_id: AtomicU64,
    storage: Arc<dyn TokenStorage>,
}

impl SessionStore {
    /// Creates a store seeded from durable storage.
    ///
    /// This is the one and only read of `storage`. A stored token becomes
    /// an authenticated session (user unknown until the next login); a
    /// read failure is logged and the store starts signed out.
    pub fn restore(storage: impl TokenStorage) -> Self {
        Self::restore_shared(Arc::new(storage))
    }

    /// [`restore`](Self::restore) for storage chosen at runtime.
    pub fn restore_shared(storage: Arc<dyn TokenStorage>) -> Self {
        let session = match storage.get() {
            Ok(Some(token)) => {
                tracing::info!("restored session from storage");
                Session::authenticated(token, None)
            }
            Ok(None) => Session::anonymous(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored token; starting signed out");
                Session::anonymous()
            }
        };

        Self {
            current: RwLock::new(Arc::new(session)),
            listeners: Arc::new(Mutex::new(Vec::new())),
            write_gate: Mutex::new(()),
            next_listener_id: AtomicU64::new(1),
            storage,
        }
    }

    /// A signed-out store backed by process memory only.
    pub fn in_memory() -> Self {
        Self::restore(MemoryTokenStorage::new())
    }

    /// Synchronous read of the current snapshot.
    pub fn session(&self) -> Arc<Session> {
        Arc::clone(
            &self.current.read().unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Replaces the session and notifies every listener before returning.
    ///
    /// The token is persisted (or removed) first. A storage failure is
    /// logged but does not stop the in-memory update: the running
    /// process must not keep using a session the server already
    /// replaced just because the disk is full.
    pub fn set_session(&self, next: Session) -> Arc<Session> {
        let _gate = self.write_gate.lock().unwrap_or_else(PoisonError::into_inner);
        self.replace_locked(next)
    }

    /// Replaces the session only if it still holds `expected` as its token.
    ///
    /// Returns the new snapshot, or `Err` with the current one when the
    /// session has moved on (signed out, signed in again, refreshed) and
    /// nothing was replaced. Nobody is notified on `Err`.
    pub fn replace_if_token(
        &self,
        expected: Option<&str>,
        next: Session,
    ) -> Result<Arc<Session>, Arc<Session>> {
        let _gate = self.write_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.session();
        if current.token() != expected {
            tracing::debug!("session changed since the update began; not replaced");
            return Err(current);
        }
        Ok(self.replace_locked(next))
    }

    /// Persist, swap, notify. Callers hold `write_gate`.
    fn replace_locked(&self, next: Session) -> Arc<Session> {
        let snapshot = Arc::new(next);
        self.persist(&snapshot);

        *self.current.write().unwrap_or_else(PoisonError::into_inner) =
            Arc::clone(&snapshot);

        tracing::info!(
            authenticated = snapshot.is_authenticated(),
            expires_at_ms = snapshot.claims().map(|c| c.expires_at_ms),
            "session replaced"
        );

        // Clone the list out so listeners run without the lock held.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(&snapshot);
        }

        snapshot
    }

    /// Signs out. Equivalent to `set_session(Session::anonymous())`.
    ///
    /// Idempotent: clearing an already-cleared store leaves it cleared
    /// (listeners are still notified).
    pub fn clear(&self) {
        self.set_session(Session::anonymous());
    }

    /// Registers a change listener.
    ///
    /// The listener is called synchronously, on the writer's thread, with
    /// every new snapshot. It stays registered until
    /// [`Subscription::unsubscribe`] is called.
    pub fn subscribe(
        &self,
        listener: impl Fn(&Session) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn persist(&self, session: &Session) {
        let result = match session.token() {
            Some(token) => self.storage.put(token),
            None => self.storage.remove(),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist session token");
        }
    }
}

/// Handle returned by [`SessionStore::subscribe`].
///
/// Dropping it does *not* unsubscribe; call [`unsubscribe`](Self::unsubscribe).
/// It holds the listener list weakly, so it never keeps a store alive.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerList>,
}

impl Subscription {
    /// Deregisters the listener. A no-op if the store is gone.
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
