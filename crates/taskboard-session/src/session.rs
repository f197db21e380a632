//! Session types: the client's record of who it is signed in as.
//!
//! A session tracks:
//! - WHETHER the client is authenticated
//! - WHAT bearer token to send (and when it expires, if we can tell)
//! - WHO the user is, for display
//!
//! A `Session` is immutable. Login, refresh, and logout each build a new
//! one and hand it to the [`SessionStore`](crate::SessionStore), which
//! swaps it in wholesale. Nothing ever edits a field in place.

use std::fmt;

use taskboard_protocol::User;

use crate::token::{Claims, decode_claims};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The authenticated identity state of the client.
///
/// Fields are private so the one invariant can't be broken:
/// `authenticated() == token().is_some()`. The only ways to build a
/// session are [`Session::anonymous`] and [`Session::authenticated`].
#[derive(Clone, PartialEq, Default)]
pub struct Session {
    token: Option<String>,
    claims: Option<Claims>,
    authenticated: bool,
    user: Option<User>,
}

impl Session {
    /// The signed-out session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A signed-in session for `token`.
    ///
    /// Claims are decoded here, once. A token whose claims can't be
    /// decoded is still accepted: the server decides whether it is
    /// valid, we just won't be able to refresh it proactively.
    pub fn authenticated(token: impl Into<String>, user: Option<User>) -> Self {
        let token = token.into();
        let claims = decode_claims(&token);
        if claims.is_none() {
            tracing::debug!("token claims undecodable; proactive refresh disabled");
        }
        Self {
            token: Some(token),
            claims,
            authenticated: true,
            user,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Projection sent to UI collaborators on every change.
    pub fn event(&self) -> SessionEvent {
        SessionEvent {
            authenticated: self.authenticated,
            user: self.user.clone(),
        }
    }
}

/// Tokens are credentials: `Debug` output (and therefore every log line
/// that formats a session) shows only whether one is present.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("claims", &self.claims)
            .field("authenticated", &self.authenticated)
            .field("user", &self.user)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// What the UI needs to know about a session change: are we signed in,
/// and as whom. Deliberately token-free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub authenticated: bool,
    pub user: Option<User>,
}
