//! Core protocol types for the Taskboard REST API.
//!
//! Two kinds of types live here:
//!
//! - **Request/response plumbing** ([`RequestSpec`], [`ApiResponse`]):
//!   what a caller hands to the dispatcher and what it gets back.
//! - **Auth wire types** ([`Credentials`], [`SignupRequest`],
//!   [`AuthPayload`], [`User`], [`ErrorBody`]): the JSON shapes the
//!   `/auth/*` endpoints speak.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use taskboard_transport::Method;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A server-assigned identifier.
///
/// The API is not consistent about id types: some backends send numbers,
/// others send strings (UUIDs, Mongo ids). `#[serde(untagged)]` accepts
/// either and writes back whatever shape it received, so ids round-trip
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Num(u64),
    Str(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        Self::Num(n)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

// ---------------------------------------------------------------------------
// RequestSpec, one logical request
// ---------------------------------------------------------------------------

/// Path prefix of the session endpoints. A 401 from these never starts
/// a token refresh: a rejected login is a real answer, and a rejected
/// refresh is the refresh failing.
pub const AUTH_PATH_PREFIX: &str = "/auth/";

/// Everything the dispatcher needs to send one logical request.
///
/// A `RequestSpec` is cheap to clone and is cloned for every retry and
/// replay, so all attempts of one request are identical apart from the
/// `Authorization` header the dispatcher fills in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/boards/3`.
    pub path: String,
    /// Query parameters, encoded by the dispatcher.
    pub query: Vec<(String, String)>,
    /// Extra headers. An explicit `Authorization` header here always wins
    /// over the session token.
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Per-request timeout. `None` uses the dispatcher default (10s).
    pub timeout: Option<Duration>,
    /// Set once the request has been replayed after a token refresh.
    /// A second 401 on a replayed request is final.
    pub auth_retried: bool,
}

impl RequestSpec {
    /// Creates a request with no body, headers, or timeout override.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout: None,
            auth_retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Appends a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Adds a header.
    pub fn header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON body and sets `Content-Type`.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if `value` can't be serialized.
    #[cfg(feature = "json")]
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self, ProtocolError> {
        use crate::{Codec, JsonCodec};

        let bytes = JsonCodec.encode(value)?;
        Ok(self
            .header("Content-Type", JsonCodec.content_type())
            .body(bytes))
    }

    /// Overrides the dispatcher's default timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns `true` if a header named `name` (case-insensitive) is set.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Returns `true` for the `/auth/*` session endpoints.
    pub fn is_auth_endpoint(&self) -> bool {
        self.path.starts_with(AUTH_PATH_PREFIX)
    }

    /// A copy of this request marked as already replayed after a refresh.
    pub fn into_auth_retried(mut self) -> Self {
        self.auth_retried = true;
        self
    }
}

// ---------------------------------------------------------------------------
// ApiResponse
// ---------------------------------------------------------------------------

/// A successful (2xx/3xx) response.
///
/// Error statuses never show up here: the dispatcher turns them into a
/// typed failure first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Decodes the body as JSON.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the body doesn't match `T`.
    #[cfg(feature = "json")]
    pub fn json<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, ProtocolError> {
        use crate::{Codec, JsonCodec};
        JsonCodec.decode(&self.body)
    }
}

// ---------------------------------------------------------------------------
// Auth wire types
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    /// "Keep me signed in". Only sent when set.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub remember: bool,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            remember: false,
        }
    }
}

/// Body of `POST /auth/signup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// The signed-in user's profile, as returned by login/signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Some backends nest the token: `{ "auth": { "token": "..." } }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NestedAuth {
    #[serde(default)]
    pub token: Option<String>,
}

/// Response of every `/auth/*` endpoint: `{ token, user }`.
///
/// Every field is optional on the wire because `/auth/refresh` may omit
/// `user` and `/auth/logout` may return nothing useful. Use
/// [`AuthPayload::token`] rather than reading the fields directly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthPayload {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub auth: Option<NestedAuth>,
}

impl AuthPayload {
    /// The bearer token, from `token` or `auth.token`. Empty strings
    /// count as absent.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .or_else(|| self.auth.as_ref()?.token.as_deref())
            .filter(|t| !t.is_empty())
    }

    /// The token, or `InvalidMessage` if the payload has none.
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidMessage` when no token is present.
    pub fn require_token(&self) -> Result<&str, ProtocolError> {
        self.token().ok_or_else(|| {
            ProtocolError::InvalidMessage("auth response has no token".into())
        })
    }
}

/// Error body the API sends with 4xx/5xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Best-effort extraction of a human-readable message from an error
    /// response body. Returns `None` for non-JSON or message-less bodies.
    #[cfg(feature = "json")]
    pub fn message_from(body: &[u8]) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
        parsed
            .message
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty())
    }
}

// =========================================================================
// Tests
// =========================================================================
