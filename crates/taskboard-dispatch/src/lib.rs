//! Request dispatch for Taskboard: the resiliency and auth layer.
//!
//! Two pieces, stacked:
//!
//! - [`RequestDispatcher`] sends one logical request. It attaches the
//!   bearer token, applies a timeout, and retries transient failures
//!   (network, timeout, 5xx) with exponential backoff.
//! - [`SessionGuard`] sits on top. When a request comes back 401 it
//!   starts a token refresh, or joins the one already running, then
//!   replays the request once with the new token. If the refresh fails
//!   it signs the session out and fails every waiting request.
//!
//! # Architecture
//!
//! ```text
//! caller → SessionGuard::dispatch → RequestDispatcher::send → HttpTransport
//!                 │ 401
//!                 ▼
//!          single-flight refresh ──▶ SessionStore::set_session / clear
//! ```

mod dispatcher;
mod failure;
mod guard;
mod retry;

pub use dispatcher::{DispatchConfig, RequestDispatcher};
pub use failure::{Failure, FailureKind};
pub use guard::{GuardState, REFRESH_PATH, SessionGuard};
pub use retry::{RetryPolicy, RetryState};
