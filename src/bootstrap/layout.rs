//! Layout staging and version-bumped apply
//!
//! The version is read once and the apply targets `read + 1`. The cluster
//! rejects the apply if someone else bumped the layout in between.

use crate::admin::{AdminApi, LayoutEntry};
use crate::bootstrap::resolver::NodeDescriptor;
use crate::common::{Error, LayoutStep, Result};

/// One layout role per resolved node
pub fn layout_entries(nodes: &[NodeDescriptor]) -> Vec<LayoutEntry> {
    nodes
        .iter()
        .map(|node| LayoutEntry {
            id: node.cluster_id.clone(),
            zone: node.zone.clone(),
            capacity: node.capacity,
            tags: node.tags.clone(),
        })
        .collect()
}

pub struct LayoutCommitter<'a, A> {
    admin: &'a A,
}

impl<'a, A: AdminApi> LayoutCommitter<'a, A> {
    pub fn new(admin: &'a A) -> Self {
        Self { admin }
    }

    /// Stage and apply the layout through `address`. Returns the applied
    /// version.
    ///
    /// A failed apply leaves the staged changes in place on the cluster.
    pub async fn commit(&self, address: &str, nodes: &[NodeDescriptor]) -> Result<u64> {
        let current = self.admin.layout(address).await?.version;
        let next = current
            .checked_add(1)
            .ok_or_else(|| Error::LayoutCommit {
                step: LayoutStep::Stage,
                reason: format!("layout version {} overflows", current),
            })?;

        let entries = layout_entries(nodes);
        tracing::info!(address, current, roles = entries.len(), "Staging layout");
        self.admin.stage_layout(address, &entries).await?;

        tracing::info!(address, version = next, "Applying layout");
        if let Err(e) = self.admin.apply_layout(address, next).await {
            tracing::error!(
                address,
                version = next,
                "Layout staged but not applied; resolve the staged changes manually"
            );
            return Err(e);
        }

        Ok(next)
    }
}
