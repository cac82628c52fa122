use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tracing::{debug, error};

use crate::app::AppState;
use crate::auth::{bearer_token, token_from_cookies, Claims};
use crate::database::{DatabaseError, User};
use crate::error::ApiError;

/// Principal id used for machine access with the Garage admin token
pub const API_KEY_USER: &str = "api-key-user";

/// Authenticated caller, inserted into request extensions
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: Some(user.email.clone()),
        }
    }
}

impl SessionUser {
    fn api_key() -> Self {
        Self {
            id: API_KEY_USER.to_string(),
            name: "API Key User".to_string(),
            email: None,
        }
    }
}

/// Session guard for protected routes. Accepts the session cookie, the Garage
/// admin token as a bearer token, or a session token as a bearer token.
pub async fn require_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, &headers).await.map_err(|e| {
        error!("session lookup failed: {}", e);
        ApiError::internal_server_error("Internal Server Error")
    })?;

    let user = user.ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
    debug!(user = %user.id, path = %request.uri().path(), "authenticated request");

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<SessionUser>, DatabaseError> {
    if let Some(token) = token_from_cookies(headers) {
        if let Some((_, user)) = resolve_session(state, &token).await? {
            return Ok(Some(SessionUser::from(&user)));
        }
    }

    if let Some(token) = bearer_token(headers) {
        if state.garage.is_admin_token(&token) {
            return Ok(Some(SessionUser::api_key()));
        }
        if let Some((_, user)) = resolve_session(state, &token).await? {
            return Ok(Some(SessionUser::from(&user)));
        }
    }

    Ok(None)
}

/// Verify a session token and load its account. `None` when the token is
/// invalid or expired, or the account no longer exists.
pub async fn resolve_session(
    state: &AppState,
    token: &str,
) -> Result<Option<(Claims, User)>, DatabaseError> {
    let claims = match state.sessions.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("rejected session token: {}", e);
            return Ok(None);
        }
    };

    let user = state.users.find_by_id(claims.sub).await?;
    Ok(user.map(|user| (claims, user)))
}
