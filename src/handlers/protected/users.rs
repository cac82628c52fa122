use axum::{extract::State, response::Json};

use crate::app::AppState;
use crate::database::User;
use crate::error::ApiResult;

/// Accounts returned by the list endpoint
pub const USER_LIST_LIMIT: i64 = 10;

/// GET /api/users/list - Dashboard accounts, without password hashes
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    let users = state.accounts.list(USER_LIST_LIMIT).await?;
    Ok(Json(users))
}
