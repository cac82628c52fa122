use axum::{
    extract::{rejection::JsonRejection, Extension, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{encode, required, with_field, IdQuery, NameQuery};
use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::garage::models::BucketPermissions;
use crate::garage::{policy, GarageError, RequestOptions};
use crate::middleware::SessionUser;

const BUCKET_ID_REQUIRED: &str = "Bucket ID is required";

/// GET /api/bucket - No operation lives at the bare path
pub async fn invalid_request() -> ApiError {
    ApiError::bad_request("Invalid request")
}

/// GET /api/bucket/list - All buckets
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let buckets = state
        .garage
        .get("bucket?list")
        .await
        .map_err(|e| policy::DEFAULT.map(&e))?;
    Ok(Json(buckets))
}

/// GET /api/bucket/info?id= - One bucket
pub async fn info(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<Value>> {
    let id = required(query.id, BUCKET_ID_REQUIRED)?;
    let bucket = state
        .garage
        .get(&format!("bucket?id={}", encode(&id)))
        .await
        .map_err(|e| policy::DEFAULT.map(&e))?;
    Ok(Json(bucket))
}

/// POST /api/bucket/create?name= - Create a bucket and give it a global alias
pub async fn create(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<Value>> {
    let name = required(query.name, "Bucket name is required")?;

    let created = state
        .garage
        .post("bucket", RequestOptions::json(json!({})))
        .await
        .map_err(|e| policy::BUCKET_CREATE.map(&e))?;

    // Only the id is needed to attach the alias
    let id = created
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            policy::BUCKET_CREATE.map(&GarageError::Decode("bucket response without id".into()))
        })?;

    state
        .garage
        .put(
            &format!("bucket/alias/global?id={}&alias={}", encode(&id), encode(&name)),
            RequestOptions::default(),
        )
        .await
        .map_err(|e| policy::BUCKET_CREATE.map(&e))?;

    info!(user = %user.id, bucket = %id, alias = %name, "bucket created");
    Ok(Json(with_field(created, "globalAliases", json!([name]))))
}

/// DELETE /api/bucket/delete?id= - Delete a bucket, empty 204 on success
pub async fn delete_no_content(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Response> {
    delete_bucket(&state, query, &user).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /api/buckets/delete?id= - Delete a bucket, confirmation body on success
pub async fn delete_with_message(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<Value>> {
    let id = delete_bucket(&state, query, &user).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Bucket {} deleted successfully", id),
    })))
}

async fn delete_bucket(state: &AppState, query: IdQuery, user: &SessionUser) -> ApiResult<String> {
    let id = required(query.id, BUCKET_ID_REQUIRED)?;
    state
        .garage
        .delete(&format!("bucket?id={}", encode(&id)), RequestOptions::default())
        .await
        .map_err(|e| policy::BUCKET_DELETE.map(&e))?;

    info!(user = %user.id, bucket = %id, "bucket deleted");
    Ok(id)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowRequest {
    #[serde(default)]
    pub bucket_id: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub permissions: Option<Value>,
}

/// POST /api/buckets/allow - Grant a key permissions on a bucket
pub async fn allow(
    State(state): State<AppState>,
    payload: Result<Json<AllowRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    const MISSING: &str = "Missing required fields";

    let Json(request) = payload.map_err(|_| ApiError::bad_request(MISSING))?;
    let bucket_id = required(request.bucket_id, MISSING)?;
    let access_key_id = required(request.access_key_id, MISSING)?;
    let permissions = match request.permissions {
        Some(Value::Object(flags)) => granted(&flags),
        _ => return Err(ApiError::bad_request(MISSING)),
    };

    let body = json!({
        "bucketId": bucket_id,
        "accessKeyId": access_key_id,
        "permissions": permissions,
    });
    let result = state
        .garage
        .post("bucket/allow", RequestOptions::json(body))
        .await
        .map_err(|e| policy::BUCKET_ALLOW.map(&e))?;
    Ok(Json(result))
}

/// Only flags that are literally `true` are granted
fn granted(flags: &serde_json::Map<String, Value>) -> BucketPermissions {
    let flag = |name: &str| flags.get(name) == Some(&Value::Bool(true));
    BucketPermissions {
        read: flag("read"),
        write: flag("write"),
        owner: flag("owner"),
    }
}
