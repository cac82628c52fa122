// Typed views of Garage admin API payloads.
//
// Pass-through routes keep the raw JSON; these types are only used where a
// handler needs to look inside a response. Unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Permission flags accepted by `bucket/allow`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPermissions {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub write: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub owner: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRole {
    pub id: String,
    pub zone: String,
    pub capacity: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Partition {
    pub total: u64,
    pub available: u64,
}

impl Partition {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.available)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    pub id: String,
    pub role: Option<NodeRole>,
    pub addr: Option<String>,
    pub hostname: Option<String>,
    #[serde(default)]
    pub is_up: bool,
    pub last_seen_secs_ago: Option<u64>,
    #[serde(default)]
    pub draining: bool,
    pub data_partition: Option<Partition>,
    pub metadata_partition: Option<Partition>,
    /// Number of partitions this node stores, when the cluster reports it
    pub partition_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    pub node: Option<String>,
    pub garage_version: Option<String>,
    pub layout_version: Option<u64>,
    #[serde(default)]
    pub nodes: Vec<NodeStatus>,
}
