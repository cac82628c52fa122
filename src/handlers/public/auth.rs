use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::app::AppState;
use crate::auth::{bearer_token, token_from_cookies};
use crate::database::User;
use crate::error::{ApiError, ApiResult};
use crate::middleware::resolve_session;
use crate::services::{SignInRequest, SignUpRequest};

/// POST /api/auth/sign-up/email - Create an account and start a session
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let user = state.accounts.register(request).await?;
    start_session(&state, &user)
}

/// POST /api/auth/sign-in/email - Check credentials and start a session
pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let email = request.email.clone();
    let user = state.accounts.authenticate(request).await.map_err(|e| {
        warn!(%email, "sign-in failed: {}", e);
        e
    })?;

    info!(user_id = %user.id, "signed in");
    start_session(&state, &user)
}

/// GET /api/auth/get-session - Current session, or null
pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let Some(token) = token_from_cookies(&headers).or_else(|| bearer_token(&headers)) else {
        return Ok(Json(Value::Null));
    };

    let session = resolve_session(&state, &token).await?;
    Ok(Json(match session {
        Some((claims, user)) => json!({
            "session": {
                "userId": user.id,
                "expiresAt": claims.expires_at(),
            },
            "user": user,
        }),
        None => Value::Null,
    }))
}

/// POST /api/auth/sign-out - Drop the session cookie
pub async fn sign_out(State(state): State<AppState>) -> Response {
    (
        [(header::SET_COOKIE, state.sessions.clear_cookie())],
        Json(json!({ "success": true })),
    )
        .into_response()
}

fn start_session(state: &AppState, user: &User) -> ApiResult<Response> {
    let (token, _) = state.sessions.issue(user).map_err(|e| {
        error!("failed to issue session: {}", e);
        ApiError::internal_server_error("Internal server error")
    })?;

    let cookie = state.sessions.cookie(&token);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "token": token, "user": user })),
    )
        .into_response())
}
