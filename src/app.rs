use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::auth::{registration_gate, SessionKeys};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::UserStore;
use crate::garage::GarageClient;
use crate::handlers::{protected, public};
use crate::middleware::require_session;
use crate::services::AccountService;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub garage: GarageClient,
    pub users: Arc<dyn UserStore>,
    pub accounts: AccountService,
    pub sessions: SessionKeys,
}

impl AppState {
    pub fn new(config: AppConfig, users: Arc<dyn UserStore>) -> anyhow::Result<Self> {
        let garage = GarageClient::new(&config.garage)?;
        let sessions = SessionKeys::new(&config.security)?;
        Ok(Self {
            config: Arc::new(config),
            garage,
            accounts: AccountService::new(users.clone()),
            users,
            sessions,
        })
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(user_public_routes())
        .nest("/api/auth", auth_routes(&state))
        // Protected
        .merge(protected_routes(&state))
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn user_public_routes() -> Router<AppState> {
    Router::new().route("/api/users/hasUsers", get(public::users::has_users))
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/sign-up/email", post(auth::sign_up))
        .route("/sign-in/email", post(auth::sign_in))
        .route("/get-session", get(auth::get_session))
        .route("/sign-out", post(auth::sign_out))
        .layer(middleware::from_fn_with_state(
            state.users.clone(),
            registration_gate,
        ))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    use protected::{bucket, key, layout, node, users};

    Router::new()
        // Buckets
        .route("/api/bucket", get(bucket::invalid_request))
        .route("/api/bucket/list", get(bucket::list))
        .route("/api/buckets/list", get(bucket::list))
        .route("/api/bucket/info", get(bucket::info))
        .route("/api/buckets", get(bucket::info))
        .route("/api/bucket/create", post(bucket::create))
        .route("/api/buckets/create", post(bucket::create))
        .route("/api/bucket/delete", delete(bucket::delete_no_content))
        .route("/api/buckets/delete", delete(bucket::delete_with_message))
        .route("/api/buckets/allow", post(bucket::allow))
        // Access keys
        .route("/api/keys", get(key::lookup))
        .route("/api/keys/list", get(key::list))
        .route("/api/keys/create", post(key::create))
        .route("/api/keys/delete", delete(key::delete))
        // Nodes
        .route("/api/nodes", get(node::nodes))
        .route("/api/nodes/list", get(node::status))
        .route("/api/nodes/status", get(node::status))
        .route("/api/nodes/health", get(node::health))
        .route("/api/nodes/info", get(node::info))
        .route("/api/nodes/usage", get(node::usage))
        .route("/api/nodes/add", post(node::add))
        // Layout
        .route("/api/layout", get(layout::get))
        // Local accounts
        .route("/api/users", get(users::list))
        .route("/api/users/list", get(users::list))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session))
}

/// Cross-origin access for the configured dashboard origins. Credentials are
/// allowed so the session cookie travels with the request.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            // A wildcard is not allowed alongside credentials
            Ok(value) if value != "*" => Some(value),
            _ => {
                warn!("ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// GET / - Service banner
async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Garage Dashboard API",
        "version": version,
        "description": "Administration backend for Garage storage clusters",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "auth": "/api/auth/sign-up/email, /api/auth/sign-in/email, /api/auth/get-session, /api/auth/sign-out (public)",
            "users": "/api/users/hasUsers (public), /api/users[/list] (protected)",
            "buckets": "/api/bucket/*, /api/buckets/* (protected)",
            "keys": "/api/keys/* (protected)",
            "nodes": "/api/nodes/* (protected)",
            "layout": "/api/layout (protected)",
        }
    }))
}

/// GET /health - Liveness, including the account store
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.users.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            warn!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "error": "database unavailable"
                })),
            )
        }
    }
}
