use axum::{
    extract::{Extension, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{encode, required, with_field, IdQuery, NameQuery};
use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::garage::{policy, RequestOptions};
use crate::middleware::SessionUser;

const KEY_ID_REQUIRED: &str = "Key ID is required";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupQuery {
    pub query: Option<String>,
    pub id: Option<String>,
    pub show_secret_key: Option<String>,
}

impl LookupQuery {
    /// Upstream route for this lookup
    fn route(self) -> ApiResult<String> {
        let field = match self.query.as_deref() {
            Some("id") => "id",
            Some("search") => "search",
            _ => return Err(ApiError::bad_request("Invalid query type")),
        };
        let id = required(self.id, KEY_ID_REQUIRED)?;

        let mut route = format!("key?{}={}", field, encode(&id));
        if matches!(self.show_secret_key.as_deref(), Some(v) if !v.is_empty() && v != "false") {
            route.push_str("&showSecretKey=true");
        }
        Ok(route)
    }
}

/// GET /api/keys?query=id|search&id= - Look up a key by id or search pattern
pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> ApiResult<Json<Value>> {
    let route = query.route()?;
    let key = state
        .garage
        .get(&route)
        .await
        .map_err(|e| policy::DEFAULT.map(&e))?;
    Ok(Json(key))
}

/// GET /api/keys/list - All access keys
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let keys = state
        .garage
        .get("key?list")
        .await
        .map_err(|e| policy::DEFAULT.map(&e))?;
    Ok(Json(keys))
}

/// POST /api/keys/create?name= - Create an access key, optionally named
pub async fn create(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<Value>> {
    let name = query.name.filter(|n| !n.is_empty());
    let body = match &name {
        Some(name) => json!({ "name": name }),
        None => json!({}),
    };

    let key = state
        .garage
        .post("key", RequestOptions::json(body))
        .await
        .map_err(|e| policy::KEY_CREATE.map(&e))?;

    info!(user = %user.id, key = ?key.get("accessKeyId"), "access key created");
    Ok(Json(match name {
        Some(name) => with_field(key, "name", json!(name)),
        None => key,
    }))
}

/// DELETE /api/keys/delete?id= - Delete an access key
pub async fn delete(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<Value>> {
    let id = required(query.id, KEY_ID_REQUIRED)?;
    let result = state
        .garage
        .delete(&format!("key?id={}", encode(&id)), RequestOptions::default())
        .await
        .map_err(|e| policy::DEFAULT.map(&e))?;

    info!(user = %user.id, key = %id, "access key deleted");
    Ok(Json(result))
}
