//! Unified error type for the Taskboard client.

use taskboard_dispatch::{Failure, FailureKind};
use taskboard_protocol::ProtocolError;
use taskboard_session::SessionError;
use taskboard_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `taskboard` crate you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impl, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TaskboardError {
    /// The request failed (network, status, or lost session).
    #[error(transparent)]
    Request(#[from] Failure),

    /// A body could not be encoded, or a response didn't decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A transport could not be set up.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Token storage could not be read or written.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Caller input rejected before anything was sent.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// Bad client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl TaskboardError {
    /// The request failure, if this is one.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Request(f) => Some(f),
            _ => None,
        }
    }

    /// `true` when the session was lost (refresh failed) and the user
    /// has to sign in again.
    pub fn is_session_lost(&self) -> bool {
        self.failure()
            .is_some_and(|f| f.kind == FailureKind::RefreshFailed)
    }
}
