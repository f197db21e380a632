//! Shared test fixtures: a scripted transport and guard builders.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskboard_dispatch::{DispatchConfig, RequestDispatcher, RetryPolicy, SessionGuard};
use taskboard_session::{MemoryTokenStorage, SessionStore};
use taskboard_transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

pub const BASE_URL: &str = "http://mock.test/api";

/// What the scripted server does with one request.
pub enum Reply {
    Status(u16, Vec<u8>),
    Fail(TransportError),
    After(Duration, Box<Reply>),
    Hang,
}

impl Reply {
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        Self::Status(status, value.to_string().into_bytes())
    }

    pub fn ok() -> Self {
        Self::json(200, serde_json::json!({ "ok": true }))
    }

    pub fn after(self, delay: Duration) -> Self {
        Self::After(delay, Box::new(self))
    }
}

type Script = dyn Fn(&HttpRequest, usize) -> Reply + Send + Sync;

/// A transport that answers from a script and records every request.
///
/// The script gets the request and its 1-based call index for that
/// path, so "fail twice, then succeed" is `|_, n| if n <= 2 { .. }`.
#[derive(Clone)]
pub struct MockTransport {
    calls: Arc<Mutex<Vec<HttpRequest>>>,
    script: Arc<Script>,
}

impl MockTransport {
    pub fn new(script: impl Fn(&HttpRequest, usize) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(script),
        }
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| path_of(r) == path)
            .count()
    }
}

impl HttpTransport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request.clone());
            calls.iter().filter(|r| r.url == request.url).count()
        };
        let mut reply = (self.script)(&request, n);
        loop {
            match reply {
                Reply::Status(status, body) => return Ok(HttpResponse::new(status, body)),
                Reply::Fail(e) => return Err(e),
                Reply::After(delay, next) => {
                    tokio::time::sleep(delay).await;
                    reply = *next;
                }
                Reply::Hang => return std::future::pending().await,
            }
        }
    }
}

/// The request path with the base URL stripped.
pub fn path_of(request: &HttpRequest) -> &str {
    request
        .url
        .strip_prefix(BASE_URL)
        .unwrap_or(&request.url)
}

pub fn bearer(request: &HttpRequest) -> Option<&str> {
    request
        .header("Authorization")
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub fn test_config() -> DispatchConfig {
    DispatchConfig {
        base_url: BASE_URL.to_string(),
        retry: RetryPolicy::default().without_jitter(),
        ..DispatchConfig::default()
    }
}

pub fn store_with(token: Option<&str>) -> Arc<SessionStore> {
    Arc::new(match token {
        Some(t) => SessionStore::restore(MemoryTokenStorage::with_token(t)),
        None => SessionStore::in_memory(),
    })
}

pub fn dispatcher(
    transport: MockTransport,
    store: &Arc<SessionStore>,
) -> RequestDispatcher<MockTransport> {
    RequestDispatcher::new(transport, Arc::clone(store), test_config())
}

pub fn guard(transport: MockTransport, store: &Arc<SessionStore>) -> SessionGuard<MockTransport> {
    SessionGuard::new(dispatcher(transport, store), Arc::clone(store))
}
