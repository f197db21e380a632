//! # Taskboard
//!
//! A resilient, session-aware client for the Taskboard REST API.
//!
//! Every request is sent with the current bearer token, retried on
//! transient failures, and, when the session has expired, replayed after
//! a single shared token refresh. The session is renewed proactively a
//! minute before it expires, and a failed refresh signs the user out.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use taskboard::prelude::*;
//!
//! # async fn run() -> Result<(), TaskboardError> {
//! let client = TaskboardClient::new(ClientConfig::from_env()?)?;
//! client.login(Credentials::new("ada@example.com", "secret")).await?;
//!
//! for board in client.list_boards().await? {
//!     println!("{}: {}", board.id, board.title);
//! }
//! # Ok(())
//! # }
//! ```

mod boards;
mod client;
mod config;
mod error;
mod suggestions;
mod tasks;

pub use client::{
    LOGIN_PATH, LOGOUT_PATH, SIGNUP_PATH, TaskboardClient, TaskboardClientBuilder,
};
pub use config::{ClientConfig, ENV_API_URL, ENV_TIMEOUT_MS, ENV_TOKEN_FILE};
pub use error::TaskboardError;
pub use suggestions::fallback_suggestions;
pub use tasks::Page;

pub use taskboard_dispatch as dispatch;
pub use taskboard_protocol as protocol;
pub use taskboard_refresh as refresh;
pub use taskboard_session as session;
pub use taskboard_transport as transport;

/// The types most callers need.
pub mod prelude {
    pub use crate::{ClientConfig, Page, TaskboardClient, TaskboardError};
    pub use taskboard_dispatch::{Failure, FailureKind, GuardState, RetryPolicy};
    pub use taskboard_protocol::{
        ApiResponse, Board, BoardPatch, Credentials, Id, NewBoard, NewTask, RequestSpec,
        SignupRequest, Suggestion, Task, TaskPage, TaskPatch, User,
    };
    pub use taskboard_refresh::RefreshConfig;
    pub use taskboard_session::{
        FileTokenStorage, MemoryTokenStorage, Session, SessionEvent, TokenStorage,
    };
}
