//! Integration tests for `TaskboardClient`: session operations, the
//! login → 401 → refresh → replay flow, and the typed service helpers.
//!
//! Runs against a routed in-memory transport with time paused.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use taskboard::prelude::*;
use taskboard::transport::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError};

// =========================================================================
// Routed transport
// =========================================================================

const BASE: &str = "http://api.test/api";

type Route = dyn Fn(&HttpRequest) -> (u16, Value) + Send + Sync;

#[derive(Clone)]
struct Router {
    log: Arc<Mutex<Vec<HttpRequest>>>,
    route: Arc<Route>,
}

impl Router {
    fn new(route: impl Fn(&HttpRequest) -> (u16, Value) + Send + Sync + 'static) -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            route: Arc::new(route),
        }
    }

    fn hits(&self, method: Method, path: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && path_of(r) == path)
            .count()
    }

    fn last(&self) -> HttpRequest {
        self.log.lock().unwrap().last().cloned().expect("no requests")
    }
}

impl HttpTransport for Router {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.log.lock().unwrap().push(request.clone());
        let (status, body) = (self.route)(&request);
        Ok(HttpResponse::new(status, body.to_string()))
    }
}

fn path_of(r: &HttpRequest) -> &str {
    r.url.strip_prefix(BASE).unwrap_or(&r.url)
}

fn bearer(r: &HttpRequest) -> Option<&str> {
    r.header("Authorization").and_then(|v| v.strip_prefix("Bearer "))
}

fn body_of(r: &HttpRequest) -> Value {
    serde_json::from_slice(r.body.as_deref().unwrap_or(b"null")).unwrap()
}

fn config() -> ClientConfig {
    ClientConfig::default()
        .with_base_url(BASE)
        .with_retry(RetryPolicy::default().without_jitter())
}

fn client(router: &Router) -> TaskboardClient<Router> {
    TaskboardClient::builder()
        .config(config())
        .build_with_transport(router.clone())
        .unwrap()
}

fn token_expiring_in(secs: u64) -> String {
    let exp = taskboard::refresh::now_epoch_ms() / 1000 + secs;
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#);
    let body = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
    format!("{header}.{body}.sig")
}

/// A backend with one valid token at a time. Login issues `t1`,
/// refresh issues `t2`; protected routes only accept the latest.
fn backend() -> Router {
    let current = Arc::new(Mutex::new(String::new()));
    Router::new(move |req| {
        let mut current = current.lock().unwrap();
        match (req.method, path_of(req)) {
            (Method::Post, "/auth/login") => {
                let body = body_of(req);
                if body["password"] != "secret" {
                    return (401, json!({ "message": "Invalid email or password" }));
                }
                *current = "t1".into();
                (200, json!({ "token": "t1", "user": { "id": 1, "name": "Ada", "email": body["email"] } }))
            }
            (Method::Post, "/auth/signup") => {
                *current = "t1".into();
                (201, json!({ "token": "t1", "user": { "id": 2, "name": "Grace" } }))
            }
            (Method::Post, "/auth/refresh") => {
                *current = "t2".into();
                (200, json!({ "token": "t2" }))
            }
            (Method::Post, "/auth/logout") => (200, json!({ "ok": true })),
            _ if bearer(req) != Some(current.as_str()) || current.is_empty() => {
                (401, json!({ "message": "jwt expired" }))
            }
            (Method::Get, "/boards") => (200, json!([{ "id": 1, "title": "Roadmap" }])),
            _ => (404, json!({ "message": "not found" })),
        }
    })
}

// =========================================================================
// Build
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_build_rejects_non_http_base_url() {
    let result = TaskboardClient::builder()
        .config(ClientConfig::default().with_base_url("localhost:5000"))
        .build_with_transport(backend());

    assert!(matches!(result, Err(TaskboardError::Config(_))));
}

#[tokio::test(start_paused = true)]
async fn test_build_restored_session_arms_refresh() {
    let client = TaskboardClient::builder()
        .config(config())
        .storage(MemoryTokenStorage::with_token(token_expiring_in(120)))
        .build_with_transport(backend())
        .unwrap();

    assert!(client.session().is_authenticated());
    assert!(client.is_refresh_scheduled());
}

// =========================================================================
// Session operations
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_login_sets_session_and_notifies() {
    let router = backend();
    let client = client(&router);
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_in_listener = Arc::clone(&events);
    let _sub = client.subscribe(move |e| events_in_listener.lock().unwrap().push(e.clone()));

    let session = client
        .login(Credentials::new("ada@example.com", "secret"))
        .await
        .unwrap();

    assert_eq!(session.token(), Some("t1"));
    assert_eq!(session.user().and_then(|u| u.name.as_deref()), Some("Ada"));
    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert!(events[0].authenticated);
    assert_eq!(events[0].user.as_ref().map(|u| u.id.clone()), Some(Id::from(1)));
}

#[tokio::test(start_paused = true)]
async fn test_login_wrong_password_fails_without_refresh() {
    let router = backend();
    let client = client(&router);

    let err = client
        .login(Credentials::new("ada@example.com", "guess"))
        .await
        .unwrap_err();

    let failure = err.failure().expect("request failure");
    assert_eq!(failure.kind, FailureKind::AuthFailure);
    assert_eq!(failure.message, "Invalid email or password");
    assert!(!client.session().is_authenticated());
    assert_eq!(client.refresh_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_login_response_without_token_is_protocol_error() {
    let router = Router::new(|_| (200, json!({ "user": { "id": 1 } })));
    let client = client(&router);

    let err = client
        .login(Credentials::new("ada@example.com", "secret"))
        .await
        .unwrap_err();

    assert!(matches!(err, TaskboardError::Protocol(_)));
    assert!(!client.session().is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn test_signup_signs_in_as_new_user() {
    let router = backend();
    let client = client(&router);

    let session = client
        .signup(SignupRequest {
            name: "Grace".into(),
            email: "grace@example.com".into(),
            password: "hopper".into(),
        })
        .await
        .unwrap();

    assert_eq!(session.token(), Some("t1"));
    assert_eq!(session.user().map(|u| u.id.clone()), Some(Id::from(2)));
    assert_eq!(body_of(&router.last())["name"], "Grace");
}

#[tokio::test(start_paused = true)]
async fn test_logout_twice_is_idempotent() {
    let router = backend();
    let client = client(&router);
    client.login(Credentials::new("ada@example.com", "secret")).await.unwrap();

    client.logout().await;
    let first = client.session();
    client.logout().await;
    let second = client.session();

    assert_eq!(*first, Session::anonymous());
    assert_eq!(*second, Session::anonymous());
    assert_eq!(router.hits(Method::Post, "/auth/logout"), 1);
    assert!(!client.is_refresh_scheduled());
}

#[tokio::test(start_paused = true)]
async fn test_logout_server_failure_still_clears() {
    let router = Router::new(|req| match path_of(req) {
        "/auth/login" => (200, json!({ "token": "t1" })),
        _ => (500, json!({ "message": "boom" })),
    });
    let client = client(&router);
    client.login(Credentials::new("ada@example.com", "secret")).await.unwrap();

    client.logout().await;

    assert!(!client.session().is_authenticated());
    // Server errors are retried before logout gives up on the server.
    assert_eq!(router.hits(Method::Post, "/auth/logout"), 3);
}

// =========================================================================
// Expiry handling
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_login_then_401_then_refresh_then_replay() {
    // Login hands out t1, but protected routes only accept t2.
    let router = Router::new(|req| match (path_of(req), bearer(req)) {
        ("/auth/login", _) => (200, json!({ "token": "t1", "user": { "id": 1 } })),
        ("/auth/refresh", _) => (200, json!({ "token": "t2" })),
        ("/boards", Some("t2")) => (200, json!([{ "id": 1, "title": "Roadmap" }])),
        _ => (401, json!({ "message": "jwt expired" })),
    });
    let client = client(&router);
    client.login(Credentials::new("ada@example.com", "secret")).await.unwrap();

    let boards = client.list_boards().await.unwrap();

    assert_eq!(boards[0].title, "Roadmap");
    assert_eq!(router.hits(Method::Post, "/auth/refresh"), 1);
    assert_eq!(router.hits(Method::Get, "/boards"), 2);
    let session = client.session();
    assert_eq!(session.token(), Some("t2"));
    // Refresh omitted the user; the login user is kept.
    assert_eq!(session.user().map(|u| u.id.clone()), Some(Id::from(1)));
    assert_eq!(client.guard_state(), GuardState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_failure_loses_session() {
    let router = Router::new(|req| match path_of(req) {
        "/auth/login" => (200, json!({ "token": "t1" })),
        "/auth/refresh" => (401, json!({ "message": "refresh token expired" })),
        _ => (401, json!({})),
    });
    let client = client(&router);
    client.login(Credentials::new("ada@example.com", "secret")).await.unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_in_listener = Arc::clone(&events);
    let _sub = client.subscribe(move |e| events_in_listener.lock().unwrap().push(e.authenticated));

    let err = client.list_boards().await.unwrap_err();

    assert!(err.is_session_lost());
    assert_eq!(err.failure().unwrap().message, "refresh token expired");
    assert!(!client.session().is_authenticated());
    assert_eq!(*events.lock().unwrap(), vec![false]);
}

#[tokio::test(start_paused = true)]
async fn test_proactive_refresh_renews_before_expiry() {
    let short = token_expiring_in(120);
    let long = token_expiring_in(7_200);
    let router = Router::new(move |req| match path_of(req) {
        "/auth/login" => (200, json!({ "token": short })),
        "/auth/refresh" => (200, json!({ "token": long })),
        _ => (404, json!({})),
    });
    let client = client(&router);
    client.login(Credentials::new("ada@example.com", "secret")).await.unwrap();
    assert!(client.is_refresh_scheduled());

    tokio::time::sleep(Duration::from_secs(61)).await;
    tokio::task::yield_now().await;

    assert_eq!(router.hits(Method::Post, "/auth/refresh"), 1);
    assert_eq!(client.refresh_count(), 1);
    assert!(client.is_refresh_scheduled(), "renewed session re-arms");
}

// =========================================================================
// Services
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_create_board_blank_title_sends_nothing() {
    let router = backend();
    let client = client(&router);

    let err = client
        .create_board(NewBoard { title: "  ".into(), description: None })
        .await
        .unwrap_err();

    assert!(matches!(err, TaskboardError::Invalid(_)));
    assert_eq!(router.log.lock().unwrap().len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_create_board_posts_json() {
    let router = Router::new(|req| (201, json!({ "id": 5, "title": body_of(req)["title"] })));
    let client = client(&router);

    let board = client
        .create_board(NewBoard { title: "Sprint 12".into(), description: None })
        .await
        .unwrap();

    assert_eq!(board.id, Id::from(5));
    assert_eq!(board.title, "Sprint 12");
    let req = router.last();
    assert_eq!(req.method, Method::Post);
    assert_eq!(req.header("content-type"), Some("application/json"));
}

#[tokio::test(start_paused = true)]
async fn test_update_and_delete_board_use_id_path() {
    let router = Router::new(|req| match req.method {
        Method::Put => (200, json!({ "id": "b1", "title": "Renamed" })),
        _ => (204, Value::Null),
    });
    let client = client(&router);
    let id = Id::from("b1");

    let board = client
        .update_board(&id, BoardPatch { title: Some("Renamed".into()), ..Default::default() })
        .await
        .unwrap();
    client.delete_board(&id).await.unwrap();

    assert_eq!(board.title, "Renamed");
    assert_eq!(router.hits(Method::Put, "/boards/b1"), 1);
    assert_eq!(router.hits(Method::Delete, "/boards/b1"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_get_board_blank_id_is_invalid() {
    let router = backend();
    let client = client(&router);

    let err = client.get_board(&Id::from("")).await.unwrap_err();

    assert!(matches!(err, TaskboardError::Invalid(_)));
}

#[tokio::test(start_paused = true)]
async fn test_list_tasks_builds_query_and_normalizes() {
    let router = Router::new(|_| {
        (200, json!({ "tasks": [{ "id": 1, "title": "Write docs", "status": "todo" }], "pagination": { "page": 2, "total": 51 } }))
    });
    let client = client(&router);

    let page = client.list_tasks(&Id::from("b 1"), Page::new(2, 25)).await.unwrap();

    assert_eq!(page.tasks.len(), 1);
    assert_eq!(page.tasks[0].status.as_deref(), Some("todo"));
    assert_eq!(page.meta.unwrap().total, Some(51));
    assert_eq!(router.last().url, format!("{BASE}/tasks?board=b+1&page=2&limit=25"));
}

#[tokio::test(start_paused = true)]
async fn test_list_tasks_default_page() {
    let router = Router::new(|_| (200, json!([])));
    let client = client(&router);

    let page = client.list_tasks(&Id::from(3), Page::default()).await.unwrap();

    assert!(page.tasks.is_empty());
    assert!(router.last().url.ends_with("/tasks?board=3&page=1&limit=50"));
}

#[tokio::test(start_paused = true)]
async fn test_create_task_requires_title() {
    let router = backend();
    let client = client(&router);

    let err = client
        .create_task(NewTask {
            title: String::new(),
            board_id: Id::from(1),
            description: None,
            priority: None,
            due_date: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, TaskboardError::Invalid(_)));
}

#[tokio::test(start_paused = true)]
async fn test_move_task_puts_status() {
    let router = Router::new(|req| {
        (200, json!({ "id": 9, "title": "Deploy", "status": body_of(req)["status"] }))
    });
    let client = client(&router);

    let task = client.move_task(&Id::from(9), "done").await.unwrap();

    assert_eq!(task.status.as_deref(), Some("done"));
    let req = router.last();
    assert_eq!(req.method, Method::Put);
    assert_eq!(path_of(&req), "/tasks/9/status");
}

#[tokio::test(start_paused = true)]
async fn test_get_update_delete_task() {
    let router = Router::new(|req| match req.method {
        Method::Get => (200, json!({ "id": 4, "title": "Old" })),
        Method::Put => (200, json!({ "id": 4, "title": "New" })),
        _ => (200, json!({ "deleted": true })),
    });
    let client = client(&router);
    let id = Id::from(4);

    assert_eq!(client.get_task(&id).await.unwrap().title, "Old");
    let patch = TaskPatch { title: Some("New".into()), ..Default::default() };
    assert_eq!(client.update_task(&id, patch).await.unwrap().title, "New");
    client.delete_task(&id).await.unwrap();

    assert_eq!(router.hits(Method::Delete, "/tasks/4"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_suggestions_from_service() {
    let router = Router::new(|_| {
        (200, json!({ "suggestions": [{ "id": "a", "suggestion": "Write tests first" }] }))
    });
    let client = client(&router);

    let suggestions = client.suggestions("ship v2").await;

    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].suggestion, "Write tests first");
    assert_eq!(body_of(&router.last())["prompt"], "ship v2");
}

#[tokio::test(start_paused = true)]
async fn test_suggestions_fall_back_on_failure() {
    let router = Router::new(|_| (503, json!({})));
    let client = client(&router);

    let suggestions = client.suggestions("ship v2").await;

    assert_eq!(suggestions, taskboard::fallback_suggestions("ship v2"));
    assert_eq!(router.hits(Method::Post, "/ai/suggestions"), 3);
}

// =========================================================================
// Persistence
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_token_file_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session/token");
    let router = backend();

    {
        let client = TaskboardClient::builder()
            .config(config().with_token_file(&path))
            .build_with_transport(router.clone())
            .unwrap();
        client.login(Credentials::new("ada@example.com", "secret")).await.unwrap();
    }

    let restarted = TaskboardClient::builder()
        .config(config().with_token_file(&path))
        .build_with_transport(router.clone())
        .unwrap();

    assert_eq!(restarted.session().token(), Some("t1"));
    assert_eq!(restarted.list_boards().await.unwrap().len(), 1);
}
