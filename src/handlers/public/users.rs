use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use tracing::error;

use crate::app::AppState;
use crate::auth::gate::USER_CHECK_FAILED;
use crate::error::{ApiError, ApiResult};

/// GET /api/users/hasUsers - Whether any account exists yet
pub async fn has_users(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let has_users = state.users.has_users().await.map_err(|e| {
        error!("user existence check failed: {}", e);
        ApiError::internal_server_error(USER_CHECK_FAILED)
    })?;

    Ok(Json(json!({ "hasUsers": has_users })))
}
