mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use common::TestApp;

fn cluster_status() -> Value {
    json!({
        "node": "n1",
        "garageVersion": "v1.0.1",
        "layoutVersion": 2,
        "nodes": [
            {
                "id": "n1",
                "addr": "10.0.0.1:3901",
                "hostname": "alpha",
                "isUp": true,
                "role": { "id": "n1", "zone": "dc1", "capacity": 1000, "tags": [] },
                "dataPartition": { "total": 1000, "available": 600 },
                "metadataPartition": { "total": 100, "available": 90 },
                "partitionCount": 128
            },
            {
                "id": "n2",
                "addr": "10.0.0.2:3901",
                "hostname": "beta",
                "isUp": true,
                "dataPartition": { "total": 1000, "available": 200 },
                "metadataPartition": { "total": 100, "available": 50 },
                "partitionCount": 128
            }
        ]
    })
}

#[tokio::test]
async fn key_lookup_builds_upstream_query() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.garage.reply(
        Method::GET,
        "/v1/key",
        StatusCode::OK,
        json!({ "accessKeyId": "GK1", "name": "dashboard" }),
    );

    let res = app
        .admin(Method::GET, "/api/keys?query=id&id=GK1&showSecretKey=true")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["accessKeyId"], "GK1");

    let res = app
        .admin(Method::GET, "/api/keys?query=search&id=dash")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let targets: Vec<_> = app.garage.requests().into_iter().map(|r| r.target).collect();
    assert_eq!(
        targets,
        vec!["/v1/key?id=GK1&showSecretKey=true", "/v1/key?search=dash"]
    );
    Ok(())
}

#[tokio::test]
async fn key_lookup_validates_query() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.admin(Method::GET, "/api/keys?query=name&id=GK1").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "Invalid query type" }));

    let res = app.admin(Method::GET, "/api/keys?query=id").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "Key ID is required" }));

    assert!(app.garage.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_key_is_not_found() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.garage.reply(
        Method::GET,
        "/v1/key",
        StatusCode::NOT_FOUND,
        json!({ "code": "NoSuchAccessKey", "message": "Access key GK9 not found" }),
    );

    let res = app.admin(Method::GET, "/api/keys?query=id&id=GK9").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "Key not found" }));
    Ok(())
}

#[tokio::test]
async fn create_key_sends_and_echoes_name() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.garage.reply(
        Method::POST,
        "/v1/key",
        StatusCode::OK,
        json!({ "accessKeyId": "GK2", "secretAccessKey": "s3cr3t" }),
    );

    let res = app
        .admin(Method::POST, "/api/keys/create?name=backup")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "accessKeyId": "GK2", "secretAccessKey": "s3cr3t", "name": "backup" })
    );

    let res = app.admin(Method::POST, "/api/keys/create").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.json::<Value>().await?.get("name").is_none());

    let requests = app.garage.requests();
    assert_eq!(requests[0].body, json!({ "name": "backup" }));
    assert_eq!(requests[1].body, json!({}));
    Ok(())
}

#[tokio::test]
async fn create_key_denied_is_forbidden() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.garage.reply(
        Method::POST,
        "/v1/key",
        StatusCode::FORBIDDEN,
        json!({ "code": "AccessDenied", "message": "Access denied" }),
    );

    let res = app.admin(Method::POST, "/api/keys/create?name=x").send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "Access denied" }));
    Ok(())
}

#[tokio::test]
async fn delete_key_requires_id() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.admin(Method::DELETE, "/api/keys/delete").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.admin(Method::DELETE, "/api/keys/delete?id=GK1").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(app.garage.requests()[0].target, "/v1/key?id=GK1");
    Ok(())
}

#[tokio::test]
async fn nodes_returns_the_node_array() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.garage
        .reply(Method::GET, "/v1/status", StatusCode::OK, cluster_status());

    let nodes: Value = app.admin(Method::GET, "/api/nodes").send().await?.json().await?;
    assert_eq!(nodes, cluster_status()["nodes"]);

    let status: Value = app
        .admin(Method::GET, "/api/nodes/list")
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(status, cluster_status());
    Ok(())
}

#[tokio::test]
async fn nodes_without_node_list_is_empty() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.garage
        .reply(Method::GET, "/v1/status", StatusCode::OK, json!({ "node": "n1" }));

    let nodes: Value = app.admin(Method::GET, "/api/nodes").send().await?.json().await?;
    assert_eq!(nodes, json!([]));
    Ok(())
}

#[tokio::test]
async fn node_fetch_failure_uses_node_policy() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.garage.reply_raw(
        Method::GET,
        "/v1/health",
        StatusCode::SERVICE_UNAVAILABLE,
        "",
    );

    let res = app.admin(Method::GET, "/api/nodes/health").send().await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "error": "An unknown error occurred" })
    );
    Ok(())
}

#[tokio::test]
async fn node_info_adds_used_space() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.garage
        .reply(Method::GET, "/v1/status", StatusCode::OK, cluster_status());

    let node: Value = app
        .admin(Method::GET, "/api/nodes/info?id=n2")
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(node["hostname"], "beta");
    assert_eq!(node["dataUsed"], 800);
    assert_eq!(node["metadataUsed"], 50);

    let res = app.admin(Method::GET, "/api/nodes/info?id=nx").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "Node not found" }));

    let res = app.admin(Method::GET, "/api/nodes/info").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "Node ID is required" }));
    Ok(())
}

#[tokio::test]
async fn usage_summarises_data_partitions() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.garage
        .reply(Method::GET, "/v1/status", StatusCode::OK, cluster_status());

    let usage: Value = app
        .admin(Method::GET, "/api/nodes/usage")
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(usage["totalStorage"], 2000);
    assert_eq!(usage["availableStorage"], 800);
    assert_eq!(usage["usedStorage"], 1200);
    assert_eq!(usage["usedPercent"], 60);
    // min(600 / 128, 200 / 128) = 1, times 256 partitions
    assert_eq!(usage["usableStorage"], 256);
    Ok(())
}

#[tokio::test]
async fn usage_without_partition_counts_leaves_usable_unknown() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.garage.reply(
        Method::GET,
        "/v1/status",
        StatusCode::OK,
        json!({
            "node": "n1",
            "nodes": [{
                "id": "n1",
                "isUp": true,
                "dataPartition": { "total": 2048, "available": 1024 }
            }]
        }),
    );

    let usage: Value = app
        .admin(Method::GET, "/api/nodes/usage")
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(usage["usedPercent"], 50);
    assert!(usage["usableStorage"].is_null());
    assert_eq!(usage["formatted"]["totalStorage"], "2 KB");
    assert_eq!(usage["formatted"]["usedStorage"], "1 KB");
    Ok(())
}

#[tokio::test]
async fn add_node_forwards_connect_id() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.garage
        .reply(Method::POST, "/v1/node", StatusCode::OK, json!([{ "success": true }]));

    let res = app
        .admin(Method::POST, "/api/nodes/add")
        .json(&json!({ "connectID": "abcd@10.0.0.3:3901" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        app.garage.requests()[0].body,
        json!({ "connectID": "abcd@10.0.0.3:3901" })
    );

    let res = app
        .admin(Method::POST, "/api/nodes/add")
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "Connect ID is required" }));
    Ok(())
}

#[tokio::test]
async fn add_node_failure_uses_add_policy() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.garage.reply(
        Method::POST,
        "/v1/node",
        StatusCode::BAD_REQUEST,
        json!({ "code": "InvalidRequest", "message": "" }),
    );

    let res = app
        .admin(Method::POST, "/api/nodes/add")
        .json(&json!({ "connectID": "abcd@10.0.0.3:3901" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "error": "An unknown error occurred" })
    );
    Ok(())
}
