use axum::{
    extract::{rejection::JsonRejection, Extension, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{required, with_field, IdQuery};
use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::garage::models::{ClusterStatus, NodeStatus};
use crate::garage::usage::StorageSummary;
use crate::garage::{policy, GarageError, RequestOptions};
use crate::middleware::SessionUser;

async fn cluster_status(state: &AppState) -> ApiResult<Value> {
    state
        .garage
        .get("status")
        .await
        .map_err(|e| policy::NODE_FETCH.map(&e))
}

/// GET /api/nodes - Node array from the cluster status
pub async fn nodes(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let mut status = cluster_status(&state).await?;
    let nodes = match status.get_mut("nodes").map(Value::take) {
        Some(nodes @ Value::Array(_)) => nodes,
        _ => json!([]),
    };
    Ok(Json(nodes))
}

/// GET /api/nodes/status - Cluster status as reported
pub async fn status(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(Json(cluster_status(&state).await?))
}

/// GET /api/nodes/health - Cluster health
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let health = state
        .garage
        .get("health")
        .await
        .map_err(|e| policy::NODE_FETCH.map(&e))?;
    Ok(Json(health))
}

/// GET /api/nodes/info?id= - One node with used space figures
pub async fn info(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<Value>> {
    let id = required(query.id, "Node ID is required")?;
    let status = cluster_status(&state).await?;

    let node = status
        .get("nodes")
        .and_then(Value::as_array)
        .and_then(|nodes| nodes.iter().find(|n| n.get("id").and_then(Value::as_str) == Some(id.as_str())))
        .cloned()
        .ok_or_else(|| ApiError::not_found("Node not found"))?;

    let parsed: NodeStatus = serde_json::from_value(node.clone()).map_err(|e| {
        policy::NODE_FETCH.map(&GarageError::Decode(format!("node status: {}", e)))
    })?;

    let node = with_field(node, "dataUsed", json!(parsed.data_partition.map(|p| p.used())));
    let node = with_field(node, "metadataUsed", json!(parsed.metadata_partition.map(|p| p.used())));
    Ok(Json(node))
}

/// GET /api/nodes/usage - Cluster-wide storage totals
pub async fn usage(State(state): State<AppState>) -> ApiResult<Json<StorageSummary>> {
    let status = cluster_status(&state).await?;
    let status: ClusterStatus = serde_json::from_value(status).map_err(|e| {
        policy::NODE_FETCH.map(&GarageError::Decode(format!("cluster status: {}", e)))
    })?;
    Ok(Json(StorageSummary::from_nodes(&status.nodes)))
}

#[derive(Debug, Deserialize)]
pub struct AddNodeRequest {
    #[serde(rename = "connectID", default)]
    pub connect_id: Option<String>,
}

/// POST /api/nodes/add - Connect a node to the cluster
pub async fn add(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    payload: Result<Json<AddNodeRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    const MISSING: &str = "Connect ID is required";

    let Json(request) = payload.map_err(|_| ApiError::bad_request(MISSING))?;
    let connect_id = required(request.connect_id, MISSING)?;

    let result = state
        .garage
        .post("node", RequestOptions::json(json!({ "connectID": connect_id })))
        .await
        .map_err(|e| policy::NODE_ADD.map(&e))?;

    info!(user = %user.id, "node connect requested");
    Ok(Json(result))
}
