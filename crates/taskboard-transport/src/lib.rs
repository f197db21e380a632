//! HTTP transport abstraction for Taskboard.
//!
//! Provides the [`HttpTransport`] trait that the request dispatcher talks
//! to, plus the raw [`HttpRequest`]/[`HttpResponse`] types that cross it.
//! Nothing above this crate touches a socket directly, which lets tests
//! swap in a scripted transport.
//!
//! # Feature Flags
//!
//! - `reqwest` (default): HTTP transport via `reqwest`

mod error;
#[cfg(feature = "reqwest")]
mod http;

pub use error::TransportError;
#[cfg(feature = "reqwest")]
pub use http::ReqwestTransport;

use std::fmt;
use std::future::Future;

/// Opaque identifier for one logical request.
///
/// Retries and replays of the same logical request keep the same id,
/// so log lines for one caller can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a new `RequestId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// The method name as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request, ready to go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub id: RequestId,
    pub method: Method,
    /// Absolute URL (base URL already joined).
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Returns the first header value whose name matches `name`
    /// case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response as received from the server, any status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Executes HTTP requests.
///
/// One call is one attempt: implementations must not retry on their own.
/// Retry, timeout, and auth policy live in the dispatcher above.
pub trait HttpTransport: Send + Sync + 'static {
    /// Sends the request and waits for the full response body.
    ///
    /// Returns `Err` only when no response was received.
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_new_and_into_inner() {
        let id = RequestId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_request_id_display() {
        let id = RequestId::new(7);
        assert_eq!(id.to_string(), "req-7");
    }

    #[test]
    fn test_method_as_str_matches_wire_names() {
        assert_eq!(Method::Get.as_str(), "GET");
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = HttpRequest {
            id: RequestId::new(1),
            method: Method::Get,
            url: "http://localhost/boards".into(),
            headers: vec![("authorization".into(), "Bearer abc".into())],
            body: None,
        };
        assert_eq!(req.header("Authorization"), Some("Bearer abc"));
        assert_eq!(req.header("Content-Type"), None);
    }
}
