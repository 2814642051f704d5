use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_REGISTER: &str = "/api/v1/auth/register";
pub const PATH_LOGIN: &str = "/api/v1/auth/login";
pub const PATH_PROFILE_ME: &str = "/api/v1/profile/me";
pub const PATH_GET_ME: &str = "/api/v1/auth/get-me";

/// Fault injection knobs for exercising partial-failure runs.
#[derive(Debug, Clone, Default)]
pub struct TestServerOptions {
    /// Reject every n-th login attempt (1-based) with 401.
    pub fail_every_nth_login: Option<u64>,

    /// Delay added to every response.
    pub latency: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    registrations: Arc<AtomicU64>,
    logins: Arc<AtomicU64>,
    authorized_calls: Arc<AtomicU64>,
    unauthorized_calls: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn registrations(&self) -> u64 {
        self.registrations.load(Ordering::Relaxed)
    }

    pub fn logins(&self) -> u64 {
        self.logins.load(Ordering::Relaxed)
    }

    pub fn authorized_calls(&self) -> u64 {
        self.authorized_calls.load(Ordering::Relaxed)
    }

    pub fn unauthorized_calls(&self) -> u64 {
        self.unauthorized_calls.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
struct Account {
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Default)]
struct Accounts {
    by_email: HashMap<String, Account>,
    sessions: HashMap<String, String>,
    next_token: u64,
}

impl Accounts {
    fn issue_token(&mut self, email: &str) -> String {
        self.next_token += 1;
        let token = format!("tok-{}-{}", self.next_token, email.len());
        self.sessions.insert(token.clone(), email.to_string());
        token
    }
}

#[derive(Clone)]
struct AppState {
    stats: TestServerStats,
    options: Arc<TestServerOptions>,
    accounts: Arc<Mutex<Accounts>>,
}

impl AppState {
    async fn enter(&self) {
        TestServerStats::inc(&self.stats.requests_total);
        if let Some(latency) = self.options.latency {
            sleep(latency).await;
        }
    }

    fn accounts(&self) -> std::sync::MutexGuard<'_, Accounts> {
        self.accounts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    username: String,
    email: String,
    password: String,
    confirm_password: String,
}

async fn handle_register(State(state): State<AppState>, body: axum::body::Bytes) -> Response {
    state.enter().await;

    let req: RegisterRequest = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => return error(StatusCode::BAD_REQUEST, "bad json"),
    };
    if req.username.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return error(StatusCode::BAD_REQUEST, "missing fields");
    }
    if req.password != req.confirm_password {
        return error(StatusCode::BAD_REQUEST, "passwords do not match");
    }

    let mut accounts = state.accounts();
    if accounts.by_email.contains_key(&req.email)
        || accounts
            .by_email
            .values()
            .any(|a| a.username == req.username)
    {
        return error(StatusCode::CONFLICT, "user already exists");
    }

    accounts.by_email.insert(
        req.email.clone(),
        Account {
            username: req.username,
            email: req.email.clone(),
            password: req.password,
        },
    );
    let token = accounts.issue_token(&req.email);
    drop(accounts);

    TestServerStats::inc(&state.stats.registrations);
    (StatusCode::CREATED, Json(json!({ "data": { "token": token } }))).into_response()
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    identity: String,
    password: String,
}

async fn handle_login(State(state): State<AppState>, body: axum::body::Bytes) -> Response {
    state.enter().await;

    let attempt = TestServerStats::inc(&state.stats.logins);
    if state
        .options
        .fail_every_nth_login
        .is_some_and(|n| n > 0 && attempt % n == 0)
    {
        return error(StatusCode::UNAUTHORIZED, "login rejected");
    }

    let req: LoginRequest = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => return error(StatusCode::BAD_REQUEST, "bad json"),
    };

    let mut accounts = state.accounts();
    let email = accounts
        .by_email
        .values()
        .find(|a| a.email == req.identity || a.username == req.identity)
        .filter(|a| a.password == req.password)
        .map(|a| a.email.clone());

    match email {
        Some(email) => {
            let token = accounts.issue_token(&email);
            (StatusCode::OK, Json(json!({ "data": { "token": token } }))).into_response()
        }
        None => error(StatusCode::UNAUTHORIZED, "invalid credentials"),
    }
}

async fn handle_me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.enter().await;

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let account = {
        let accounts = state.accounts();
        token
            .and_then(|t| accounts.sessions.get(t))
            .and_then(|email| accounts.by_email.get(email))
            .cloned()
    };

    match account {
        Some(a) => {
            TestServerStats::inc(&state.stats.authorized_calls);
            (
                StatusCode::OK,
                Json(json!({ "data": { "username": a.username, "email": a.email } })),
            )
                .into_response()
        }
        None => {
            TestServerStats::inc(&state.stats.unauthorized_calls);
            error(StatusCode::UNAUTHORIZED, "unauthorized")
        }
    }
}

pub fn router(stats: TestServerStats, options: TestServerOptions) -> Router {
    let state = AppState {
        stats,
        options: Arc::new(options),
        accounts: Arc::new(Mutex::new(Accounts::default())),
    };

    Router::new()
        .route(PATH_REGISTER, post(handle_register))
        .route(PATH_LOGIN, post(handle_login))
        .route(PATH_PROFILE_ME, get(handle_me))
        .route(PATH_GET_ME, get(handle_me))
        .with_state(state)
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(TestServerOptions::default()).await
    }

    pub async fn start_with(options: TestServerOptions) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();
        let app = router(stats.clone(), options);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        Ok(Self {
            addr,
            base_url: format!("http://{addr}"),
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
