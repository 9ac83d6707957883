//! Peer resolution: host nodes → node descriptors
//!
//! A descriptor joins two owners' data: address and labels from the
//! orchestrator, cluster identity from the node's own admin endpoint. It is
//! only built once the admin endpoint has answered.

use crate::admin::AdminApi;
use crate::common::{label, parse_capacity, parse_tags, BootstrapConfig, Error, Result};
use crate::inventory::{Inventory, SwarmNode};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Node label keys carrying layout settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelKeys {
    pub zone: String,
    pub capacity: String,
    pub tags: String,
}

impl LabelKeys {
    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self {
            zone: config.zone_label.clone(),
            capacity: config.capacity_label.clone(),
            tags: config.tags_label.clone(),
        }
    }
}

/// Fully resolved cluster member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub host_node_id: String,
    pub address: String,
    pub cluster_id: String,
    pub zone: Option<String>,
    pub capacity: Option<u64>,
    pub tags: Vec<String>,
}

/// Orchestrator half of a descriptor, before the identity probe
#[derive(Debug, Clone, PartialEq, Eq)]
struct NodePlacement {
    host_node_id: String,
    address: String,
    zone: Option<String>,
    capacity: Option<u64>,
    tags: Vec<String>,
}

impl NodePlacement {
    fn from_node(node: SwarmNode, keys: &LabelKeys) -> Self {
        let zone = label(&node.labels, &keys.zone).map(str::to_string);
        let raw_capacity = label(&node.labels, &keys.capacity);
        let capacity = parse_capacity(raw_capacity);
        if let (Some(raw), None) = (raw_capacity, capacity) {
            tracing::warn!(
                node = %node.id,
                label = %keys.capacity,
                value = raw,
                "Ignoring capacity label without a positive leading integer"
            );
        }
        let tags = parse_tags(label(&node.labels, &keys.tags));

        Self {
            host_node_id: node.id,
            address: node.address,
            zone,
            capacity,
            tags,
        }
    }

    fn with_identity(self, cluster_id: String) -> NodeDescriptor {
        NodeDescriptor {
            host_node_id: self.host_node_id,
            address: self.address,
            cluster_id,
            zone: self.zone,
            capacity: self.capacity,
            tags: self.tags,
        }
    }
}

pub struct PeerResolver<'a, I, A> {
    inventory: &'a I,
    admin: &'a A,
    keys: LabelKeys,
    probe_timeout: Duration,
    concurrency: usize,
}

impl<'a, I: Inventory, A: AdminApi> PeerResolver<'a, I, A> {
    pub fn new(
        inventory: &'a I,
        admin: &'a A,
        keys: LabelKeys,
        probe_timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            inventory,
            admin,
            keys,
            probe_timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolve every host node, keeping input order.
    ///
    /// Up to `concurrency` nodes are in flight at once; the first failure
    /// aborts the whole resolution.
    pub async fn resolve(&self, host_node_ids: &[String]) -> Result<Vec<NodeDescriptor>> {
        stream::iter(host_node_ids)
            .map(|id| self.resolve_one(id))
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    async fn resolve_one(&self, host_node_id: &str) -> Result<NodeDescriptor> {
        let node = self.inventory.get_node(host_node_id).await?;
        let placement = NodePlacement::from_node(node, &self.keys);

        let status = tokio::time::timeout(self.probe_timeout, self.admin.status(&placement.address))
            .await
            .map_err(|_| Error::AdminUnreachable {
                address: placement.address.clone(),
                reason: format!("no status reply within {:?}", self.probe_timeout),
            })??;

        if status.node.is_empty() {
            return Err(Error::AdminUnreachable {
                address: placement.address,
                reason: "status reply carries no node id".into(),
            });
        }

        tracing::info!(
            host_node = %placement.host_node_id,
            address = %placement.address,
            cluster_id = %status.node,
            zone = ?placement.zone,
            capacity = ?placement.capacity,
            "Resolved peer"
        );
        Ok(placement.with_identity(status.node))
    }
}
