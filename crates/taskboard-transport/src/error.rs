/// Errors that can occur in the transport layer.
///
/// A transport error means no HTTP response reached us. Responses with
/// error statuses (4xx, 5xx) are *not* transport errors; they come back
/// as an ordinary [`HttpResponse`](crate::HttpResponse).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request never got a response: DNS failure, refused
    /// connection, reset mid-body, and so on.
    #[error("network error: {0}")]
    Network(String),

    /// The transport gave up waiting for the server.
    #[error("request timed out")]
    Timeout,

    /// The request could not be built (bad URL, invalid header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
