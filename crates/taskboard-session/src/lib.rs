//! Client session management for Taskboard.
//!
//! This crate owns the "who am I signed in as" state:
//!
//! 1. **Token decoding**: reading the expiry out of a bearer token
//!    ([`decode_claims`])
//! 2. **Session state**: the current [`Session`], owned by a
//!    [`SessionStore`] that notifies subscribers on every change
//! 3. **Persistence**: saving the token so a restart stays signed in
//!    ([`TokenStorage`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Dispatch Layer (above)  ← reads the token for every request, replaces
//!     ↕                     the session after login/refresh/logout
//! Session Layer (this crate)
//!     ↕
//! Protocol Layer (below)  ← provides the User type
//! ```

mod error;
mod session;
mod storage;
mod store;
mod token;

pub use error::SessionError;
pub use session::{Session, SessionEvent};
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};
pub use store::{SessionStore, Subscription};
pub use token::{Claims, decode_claims};
