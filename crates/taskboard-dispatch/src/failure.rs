//! The typed failure every dispatched request can end in.

use std::fmt;

use taskboard_protocol::{ErrorBody, ProtocolError};
use taskboard_transport::TransportError;

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No response reached us.
    Network,
    /// The request exceeded its timeout.
    Timeout,
    /// A 4xx other than 401. Never retried.
    Http4xx,
    /// A 5xx. Retried up to the budget.
    Http5xx,
    /// A 401. Triggers (or joins) the token refresh.
    AuthFailure,
    /// The token refresh itself failed. Terminal; the session is cleared.
    RefreshFailed,
    /// The response decoded but is missing what the API promises.
    MalformedResponse,
}

impl FailureKind {
    /// Wire-style name, used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Http4xx => "http_4xx",
            Self::Http5xx => "http_5xx",
            Self::AuthFailure => "auth_failure",
            Self::RefreshFailed => "refresh_failed",
            Self::MalformedResponse => "malformed_response",
        }
    }

    /// Transient kinds: retried locally before they surface.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Http5xx)
    }

    /// Message used when the server didn't supply one.
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::Network => "Network error. Check your connection and try again.",
            Self::Timeout => "The server took too long to respond.",
            Self::Http4xx => "The request was rejected.",
            Self::Http5xx => "The server ran into a problem. Try again later.",
            Self::AuthFailure => "Your session has expired.",
            Self::RefreshFailed => "Your session has expired. Please sign in again.",
            Self::MalformedResponse => "The server sent an unexpected response.",
        }
    }

    /// Classifies an error status. `None` for statuses below 400.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            401 => Some(Self::AuthFailure),
            400..=499 => Some(Self::Http4xx),
            500.. => Some(Self::Http5xx),
            _ => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A surfaced request failure: what went wrong, the HTTP status if there
/// was one, and a message fit to show a user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub status: Option<u16>,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    /// A failure with the kind's fallback message.
    pub fn from_kind(kind: FailureKind) -> Self {
        Self::new(kind, kind.fallback_message())
    }

    /// Builds the failure for an error response. The server's
    /// `message`/`error` field is used when the body has one.
    ///
    /// Statuses below 400 aren't failures; they classify as `Http4xx`
    /// here only so the function is total.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let kind = FailureKind::from_status(status).unwrap_or(FailureKind::Http4xx);
        let message = ErrorBody::message_from(body)
            .unwrap_or_else(|| kind.fallback_message().to_string());
        Self {
            kind,
            status: Some(status),
            message,
        }
    }

    /// The terminal failure handed to every caller waiting on a refresh
    /// that failed. Keeps the cause's status and message.
    pub fn refresh_failed(cause: &Failure) -> Self {
        Self {
            kind: FailureKind::RefreshFailed,
            status: cause.status,
            message: cause.message.clone(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<TransportError> for Failure {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout => Self::from_kind(FailureKind::Timeout),
            TransportError::Network(detail) => {
                tracing::debug!(%detail, "transport error");
                Self::from_kind(FailureKind::Network)
            }
            // A request we couldn't even build is a caller bug; it is
            // not retryable and not the network's fault.
            TransportError::InvalidRequest(detail) => {
                Self::new(FailureKind::Http4xx, format!("invalid request: {detail}"))
            }
        }
    }
}

impl From<ProtocolError> for Failure {
    fn from(e: ProtocolError) -> Self {
        tracing::debug!(error = %e, "response body did not match");
        Self::from_kind(FailureKind::MalformedResponse)
    }
}
