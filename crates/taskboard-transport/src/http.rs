//! HTTP transport implementation using `reqwest`.

use crate::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError};

/// A `reqwest`-backed [`HttpTransport`].
///
/// The inner client keeps its own connection pool, so one transport
/// should be shared for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest::Client`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom client (proxy settings, TLS roots, pool reuse).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}

impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_error)?;

        tracing::trace!(
            id = %request.id,
            method = %request.method,
            status,
            bytes = body.len(),
            "http response received"
        );

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
