//! Peer mesh construction and gossip convergence wait

use crate::admin::AdminApi;
use crate::bootstrap::gate::{GateOutcome, ReadinessGate};
use crate::bootstrap::resolver::NodeDescriptor;
use crate::common::{host_port, Error, Result};

/// Peer link the cluster dials: `<cluster id>@<host>:<rpc port>`
pub fn peer_link(node: &NodeDescriptor, rpc_port: u16) -> String {
    format!("{}@{}", node.cluster_id, host_port(&node.address, rpc_port))
}

pub struct MeshBuilder<'a, A> {
    admin: &'a A,
    rpc_port: u16,
    gate: ReadinessGate,
}

impl<'a, A: AdminApi> MeshBuilder<'a, A> {
    pub fn new(admin: &'a A, rpc_port: u16, gate: ReadinessGate) -> Self {
        Self {
            admin,
            rpc_port,
            gate,
        }
    }

    /// Hand the full peer list to the first node, then wait until the last
    /// node sees every peer connected.
    ///
    /// Returns the convergence gate outcome.
    pub async fn build(&self, nodes: &[NodeDescriptor]) -> Result<GateOutcome> {
        let (first, last) = match (nodes.first(), nodes.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(Error::Inventory("no resolved nodes to mesh".into())),
        };

        let peers: Vec<String> = nodes.iter().map(|n| peer_link(n, self.rpc_port)).collect();
        tracing::info!(via = %first.address, peers = peers.len(), "Connecting peers");

        let results = self.admin.connect(&first.address, &peers).await?;
        for (peer, result) in peers.iter().zip(&results) {
            if !result.success {
                tracing::warn!(
                    peer = %peer,
                    error = result.error.as_deref().unwrap_or("unknown"),
                    "Peer connect failed; relying on gossip"
                );
            }
        }

        // Check convergence on a node other than the one that was instructed
        let outcome = self
            .gate
            .wait(peers.len(), || async {
                Ok::<usize, Error>(self.admin.health(&last.address).await?.connected_nodes)
            })
            .await?;

        tracing::info!(
            observed = outcome.observed,
            attempts = outcome.attempts,
            checked_on = %last.address,
            "Gossip converged"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str, address: &str) -> NodeDescriptor {
        NodeDescriptor {
            host_node_id: format!("swarm-{}", id),
            address: address.into(),
            cluster_id: id.into(),
            zone: None,
            capacity: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_peer_link_format() {
        assert_eq!(
            peer_link(&descriptor("563e1ac825ee3323", "10.0.0.7"), 3901),
            "563e1ac825ee3323@10.0.0.7:3901"
        );
        assert_eq!(
            peer_link(&descriptor("abc", "fd00::7"), 3901),
            "abc@[fd00::7]:3901"
        );
    }
}
