#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{json, Value};

use garage_dashboard::config::AppConfig;
use garage_dashboard::database::{DatabaseError, MemoryUserStore, NewUser, User, UserStore};
use garage_dashboard::{app, AppState};

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const PASSWORD: &str = "correct-horse-battery";

/// One call received by the mock admin API
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    /// Path and query, e.g. `/v1/bucket?list`
    pub target: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
enum Reply {
    Json(StatusCode, Value),
    Raw(StatusCode, &'static str),
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    replies: Arc<Mutex<HashMap<String, Reply>>>,
}

/// Stand-in for the Garage admin API. Replies are keyed by method and path
/// (query ignored); unknown routes answer 200 `{}`.
#[derive(Clone)]
pub struct MockGarage {
    pub base_url: String,
    state: MockState,
}

impl MockGarage {
    pub async fn start() -> Result<Self> {
        let state = MockState::default();
        let router = Router::new().fallback(record).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            state,
        })
    }

    pub fn reply(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.insert(method, path, Reply::Json(status, body));
    }

    pub fn reply_raw(&self, method: Method, path: &str, status: StatusCode, body: &'static str) {
        self.insert(method, path, Reply::Raw(status, body));
    }

    fn insert(&self, method: Method, path: &str, reply: Reply) {
        self.state
            .replies
            .lock()
            .unwrap()
            .insert(format!("{} {}", method, path), reply);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn record(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        target: uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default(),
        authorization: header("authorization"),
        content_type: header("content-type"),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    let key = format!("{} {}", method, uri.path());
    let reply = state.replies.lock().unwrap().get(&key).cloned();
    match reply {
        Some(Reply::Json(status, body)) => (status, axum::Json(body)).into_response(),
        Some(Reply::Raw(status, body)) => (status, body).into_response(),
        None => axum::Json(json!({})).into_response(),
    }
}

/// User store whose database is gone: every call fails. Counts the
/// inserts it was asked for.
#[derive(Default)]
pub struct FailingUserStore {
    creates: AtomicUsize,
}

impl FailingUserStore {
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

fn unavailable() -> DatabaseError {
    DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl UserStore for FailingUserStore {
    async fn has_users(&self) -> Result<bool, DatabaseError> {
        Err(unavailable())
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        Err(unavailable())
    }

    async fn find_by_id(&self, _id: uuid::Uuid) -> Result<Option<User>, DatabaseError> {
        Err(unavailable())
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, DatabaseError> {
        Err(unavailable())
    }

    async fn create(&self, _user: NewUser) -> Result<User, DatabaseError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Err(unavailable())
    }

    async fn list(&self, _limit: i64) -> Result<Vec<User>, DatabaseError> {
        Err(unavailable())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Err(unavailable())
    }
}

/// The dashboard backend running on an ephemeral port
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub garage: MockGarage,
    pub users: Arc<dyn UserStore>,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        let garage = MockGarage::start().await?;
        let url = garage.base_url.clone();
        Self::spawn_with(garage, &url, Some(ADMIN_TOKEN), Arc::new(MemoryUserStore::new())).await
    }

    /// Backend whose admin credential is not configured
    pub async fn spawn_without_token() -> Result<Self> {
        let garage = MockGarage::start().await?;
        let url = garage.base_url.clone();
        Self::spawn_with(garage, &url, None, Arc::new(MemoryUserStore::new())).await
    }

    /// Backend pointed at an address nobody listens on
    pub async fn spawn_unreachable() -> Result<Self> {
        let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}", closed.local_addr()?);
        drop(closed);
        let garage = MockGarage::start().await?;
        Self::spawn_with(garage, &url, Some(ADMIN_TOKEN), Arc::new(MemoryUserStore::new())).await
    }

    /// Backend on top of a caller-provided user store
    pub async fn spawn_with_store(users: Arc<dyn UserStore>) -> Result<Self> {
        let garage = MockGarage::start().await?;
        let url = garage.base_url.clone();
        Self::spawn_with(garage, &url, Some(ADMIN_TOKEN), users).await
    }

    async fn spawn_with(
        garage: MockGarage,
        garage_url: &str,
        token: Option<&str>,
        users: Arc<dyn UserStore>,
    ) -> Result<Self> {
        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("APP_ENV", "development".into());
        vars.insert("GARAGE_API_URL", garage_url.to_string());
        vars.insert("GARAGE_TIMEOUT_SECS", "5".into());
        vars.insert("SESSION_SECRET", "integration-test-secret".into());
        if let Some(token) = token {
            vars.insert("GARAGE_API_KEY", token.to_string());
        }
        let config = AppConfig::from_vars(|name| vars.get(name).cloned())?;

        let state = AppState::new(config, users.clone())?;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: format!("http://{}", addr),
            client,
            garage,
            users,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url("/api/auth/sign-up/email"))
            .json(&json!({ "name": "", "email": email, "password": password }))
            .send()
            .await?)
    }

    /// Register the first account and return its `Cookie` header value
    pub async fn login_cookie(&self) -> Result<String> {
        let res = self.sign_up("admin@example.com", PASSWORD).await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "sign-up failed: {}", res.status());
        session_cookie(&res).context("sign-up did not set a session cookie")
    }

    /// Request authorized with the admin bearer token
    pub fn admin(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(ADMIN_TOKEN)
    }
}

/// `name=value` part of the session `Set-Cookie` header
pub fn session_cookie(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("garage_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
