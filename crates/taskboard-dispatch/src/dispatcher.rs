//! Sends one logical request: token, timeout, retries.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use taskboard_protocol::{ApiResponse, RequestSpec};
use taskboard_session::{Session, SessionStore};
use taskboard_transport::{HttpRequest, HttpTransport, RequestId, TransportError};
use tokio::time;
use tracing::{debug, warn};
use url::Url;

use crate::{Failure, FailureKind, RetryPolicy};

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Prefix joined onto every request path.
    pub base_url: String,
    /// Timeout for requests that don't set their own. Default: 10 s.
    pub default_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            default_timeout: Self::DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl DispatchConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:5000/api";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Sends requests over an [`HttpTransport`], retrying transient failures.
///
/// The dispatcher knows nothing about refreshing: a 401 comes back as
/// [`FailureKind::AuthFailure`] on the first attempt, and deciding what
/// to do about it is the guard's job.
pub struct RequestDispatcher<T: HttpTransport> {
    transport: T,
    store: Arc<SessionStore>,
    config: DispatchConfig,
    next_id: AtomicU64,
}

impl<T: HttpTransport> RequestDispatcher<T> {
    pub fn new(transport: T, store: Arc<SessionStore>, config: DispatchConfig) -> Self {
        Self {
            transport,
            store,
            config,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `spec` with the token from the current session snapshot.
    pub async fn send(&self, spec: &RequestSpec) -> Result<ApiResponse, Failure> {
        let session = self.store.session();
        self.send_as(spec, &session).await
    }

    /// Sends `spec` with `session`'s token.
    ///
    /// Every attempt (first try and retries) is the same request: the
    /// token is resolved once, up front.
    pub async fn send_as(
        &self,
        spec: &RequestSpec,
        session: &Session,
    ) -> Result<ApiResponse, Failure> {
        let request = self.build_request(spec, session)?;
        let timeout = spec.timeout.unwrap_or(self.config.default_timeout);
        let mut retry = self.config.retry.start();

        loop {
            debug!(
                request_id = %request.id,
                method = %request.method,
                path = %spec.path,
                attempt = retry.retries_used() + 1,
                "dispatching"
            );
            let failure = match self.attempt(request.clone(), timeout).await {
                Ok(response) => return Ok(response),
                Err(failure) => failure,
            };

            let Some(delay) = retry.next_delay(&failure) else {
                debug!(
                    request_id = %request.id,
                    kind = %failure.kind,
                    status = failure.status,
                    "request failed"
                );
                return Err(failure);
            };
            warn!(
                request_id = %request.id,
                kind = %failure.kind,
                delay_ms = delay.as_millis() as u64,
                retries_left = retry.attempts_remaining(),
                "transient failure; retrying"
            );
            time::sleep(delay).await;
        }
    }

    /// One attempt: transport call under the timeout, then status
    /// classification.
    async fn attempt(
        &self,
        request: HttpRequest,
        timeout: Duration,
    ) -> Result<ApiResponse, Failure> {
        let response = match time::timeout(timeout, self.transport.execute(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(e.into()),
            Err(_elapsed) => return Err(Failure::from_kind(FailureKind::Timeout)),
        };

        if FailureKind::from_status(response.status).is_some() {
            return Err(Failure::from_response(response.status, &response.body));
        }
        Ok(ApiResponse {
            status: response.status,
            body: response.body,
        })
    }

    fn build_request(
        &self,
        spec: &RequestSpec,
        session: &Session,
    ) -> Result<HttpRequest, TransportError> {
        let mut headers = spec.headers.clone();
        if !spec.has_header("Authorization") {
            if let Some(token) = session.token() {
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            }
        }

        Ok(HttpRequest {
            id: RequestId::new(self.next_id.fetch_add(1, Ordering::Relaxed)),
            method: spec.method,
            url: request_url(&self.config.base_url, spec)?.into(),
            headers,
            body: spec.body.clone(),
        })
    }
}

/// Resolves `spec`'s path and query against `base`.
///
/// Path segments are appended to the base path rather than replacing it,
/// so `/boards` on `http://host/api` is `http://host/api/boards`. Absolute
/// URLs pass through untouched.
pub(crate) fn request_url(base: &str, spec: &RequestSpec) -> Result<Url, TransportError> {
    let invalid = |e: url::ParseError| TransportError::InvalidRequest(e.to_string());
    let mut url = if spec.path.starts_with("http://") || spec.path.starts_with("https://") {
        Url::parse(&spec.path).map_err(invalid)?
    } else {
        let mut url = Url::parse(base).map_err(invalid)?;
        url.path_segments_mut()
            .map_err(|()| TransportError::InvalidRequest(format!("{base} cannot be a base URL")))?
            .pop_if_empty()
            .extend(spec.path.split('/').filter(|s| !s.is_empty()));
        url
    };
    if !spec.query.is_empty() {
        url.query_pairs_mut().extend_pairs(&spec.query);
    }
    Ok(url)
}
