//! Bootstrap pipeline
//!
//! One linear pass, no stage is retried:
//! 1. resolve the expected task count
//! 2. wait until that many tasks run
//! 3. resolve every host node into a descriptor
//! 4. connect the mesh and wait for gossip convergence
//! 5. stage and apply the layout
//!
//! Any error, including an exhausted gate, aborts the run.

pub mod gate;
pub mod layout;
pub mod mesh;
pub mod resolver;

pub use gate::{GateOutcome, ReadinessGate};
pub use layout::{layout_entries, LayoutCommitter};
pub use mesh::{peer_link, MeshBuilder};
pub use resolver::{LabelKeys, NodeDescriptor, PeerResolver};

use crate::admin::AdminApi;
use crate::common::{BootstrapConfig, Error, Result};
use crate::inventory::{host_nodes, list_running_tasks, resolve_expected_size, Inventory};
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub service: String,
    pub expected_tasks: usize,
    pub peers: Vec<NodeDescriptor>,
    pub layout_version: u64,
    /// Task readiness polls, including the satisfied one
    pub task_polls: u32,
    /// Gossip convergence polls, including the satisfied one
    pub gossip_polls: u32,
}

/// Run parameters, split out of the full config
#[derive(Debug, Clone)]
pub struct BootstrapSettings {
    pub service_name: String,
    pub placement_label: String,
    pub labels: LabelKeys,
    pub rpc_port: u16,
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub probe_timeout: Duration,
    pub resolve_concurrency: usize,
}

impl BootstrapSettings {
    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self {
            service_name: config.service_name.clone(),
            placement_label: config.placement_label.clone(),
            labels: LabelKeys::from_config(config),
            rpc_port: config.rpc_port,
            poll_interval: config.poll_interval(),
            max_attempts: config.max_attempts,
            probe_timeout: config.probe_timeout(),
            resolve_concurrency: config.resolve_concurrency,
        }
    }

    fn gate(&self, name: &str) -> ReadinessGate {
        ReadinessGate::new(name, self.poll_interval, self.max_attempts)
    }
}

pub struct Bootstrapper<I, A> {
    inventory: I,
    admin: A,
    settings: BootstrapSettings,
}

impl<I: Inventory, A: AdminApi> Bootstrapper<I, A> {
    pub fn new(inventory: I, admin: A, settings: BootstrapSettings) -> Self {
        Self {
            inventory,
            admin,
            settings,
        }
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    pub fn admin(&self) -> &A {
        &self.admin
    }

    pub async fn run(&self) -> Result<BootstrapReport> {
        let settings = &self.settings;
        tracing::info!(service = %settings.service_name, "Starting cluster bootstrap");

        let service = self
            .inventory
            .find_service(&settings.service_name, &settings.placement_label)
            .await?;
        let expected = resolve_expected_size(&self.inventory, &service).await?;
        if expected == 0 {
            return Err(Error::Inventory(format!(
                "service {} expects no tasks",
                service.name
            )));
        }
        tracing::info!(mode = ?service.mode, expected, "Found expected task(s)");

        // The last poll's task list is the one resolution works from
        let last_poll = Mutex::new(Vec::new());
        let outcome = settings
            .gate("task readiness")
            .wait(expected, || async {
                let tasks = list_running_tasks(&self.inventory, &settings.service_name).await?;
                let count = tasks.len();
                *last_poll.lock().unwrap_or_else(|e| e.into_inner()) = tasks;
                Ok::<usize, Error>(count)
            })
            .await?;
        let running = last_poll.into_inner().unwrap_or_else(|e| e.into_inner());
        tracing::info!(
            running = outcome.observed,
            expected,
            attempts = outcome.attempts,
            "All expected tasks running"
        );

        let host_node_ids = host_nodes(&running);
        let peers = PeerResolver::new(
            &self.inventory,
            &self.admin,
            settings.labels.clone(),
            settings.probe_timeout,
            settings.resolve_concurrency,
        )
        .resolve(&host_node_ids)
        .await?;

        let convergence =
            MeshBuilder::new(&self.admin, settings.rpc_port, settings.gate("gossip convergence"))
                .build(&peers)
                .await?;

        // The convergence gate just proved the last node healthy
        let healthy = peers
            .last()
            .ok_or_else(|| Error::Inventory("no resolved peers".into()))?;
        let layout_version = LayoutCommitter::new(&self.admin)
            .commit(&healthy.address, &peers)
            .await?;

        tracing::info!(
            version = layout_version,
            nodes = peers.len(),
            "Layout applied; bootstrap complete"
        );

        Ok(BootstrapReport {
            service: service.name,
            expected_tasks: expected,
            peers,
            layout_version,
            task_polls: outcome.attempts,
            gossip_polls: convergence.attempts,
        })
    }
}
