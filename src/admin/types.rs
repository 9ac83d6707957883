//! Garage admin API payloads

use serde::{Deserialize, Serialize};

/// `GET /status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node's own cluster identity
    pub node: String,
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub connected_nodes: usize,
    #[serde(default)]
    pub known_nodes: Option<usize>,
    #[serde(default)]
    pub status: Option<String>,
}

/// `GET /layout`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutResponse {
    pub version: u64,
}

/// One element of the `POST /connect` reply, same order as the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectResult {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Staged role for one node, `POST /layout`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// `null` lets the cluster apply its default weight
    pub capacity: Option<u64>,
    pub tags: Vec<String>,
}

/// `POST /layout/apply`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyLayoutRequest {
    pub version: u64,
}
