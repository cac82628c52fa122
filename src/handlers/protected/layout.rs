use axum::{extract::State, response::Json};
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiResult;
use crate::garage::policy;

/// GET /api/layout - Current and staged role assignments
pub async fn get(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let layout = state
        .garage
        .get("layout")
        .await
        .map_err(|e| policy::DEFAULT.map(&e))?;
    Ok(Json(layout))
}
