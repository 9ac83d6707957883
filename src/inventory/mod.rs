//! Orchestration inventory
//!
//! The bootstrap only ever reads from the orchestrator:
//! - the target service and its scaling mode
//! - the service's tasks and their lifecycle state
//! - per-node address and labels
//!
//! Nothing is cached; every call is a fresh query.

pub mod docker;
pub mod types;

pub use docker::{DockerInventory, EngineEndpoint, DEFAULT_DOCKER_HOST};
pub use types::{ScalingMode, ServiceSpec, SwarmNode, TaskInstance, TaskState};

use crate::common::Result;

/// Read-only view of the orchestration platform
#[allow(async_fn_in_trait)]
pub trait Inventory {
    /// Look up the service by name. `placement_label` is attached when the
    /// service runs in constrained-set (global) mode.
    async fn find_service(&self, name: &str, placement_label: &str) -> Result<ServiceSpec>;

    /// Count nodes labelled `<label>=true`
    async fn count_labelled_nodes(&self, label: &str) -> Result<usize>;

    /// All tasks of a service, in any state
    async fn list_tasks(&self, service_name: &str) -> Result<Vec<TaskInstance>>;

    /// Node details; `Error::NodeLookup` if the node is gone
    async fn get_node(&self, node_id: &str) -> Result<SwarmNode>;
}

/// Number of tasks the service should end up running.
pub async fn resolve_expected_size<I: Inventory>(inventory: &I, spec: &ServiceSpec) -> Result<usize> {
    let expected = match &spec.mode {
        ScalingMode::FixedCount { replicas } => *replicas,
        ScalingMode::ConstrainedSet { placement_label } => {
            inventory.count_labelled_nodes(placement_label).await?
        }
    };

    tracing::debug!(service = %spec.name, expected, "Resolved expected task count");
    Ok(expected)
}

/// Tasks of the service currently in the `running` state.
pub async fn list_running_tasks<I: Inventory>(
    inventory: &I,
    service_name: &str,
) -> Result<Vec<TaskInstance>> {
    let tasks = inventory.list_tasks(service_name).await?;
    Ok(tasks.into_iter().filter(|t| t.state.is_running()).collect())
}

/// Host node ids of the given tasks, first-seen order, without repeats.
pub fn host_nodes(tasks: &[TaskInstance]) -> Vec<String> {
    let mut seen = Vec::with_capacity(tasks.len());
    for task in tasks {
        if task.node_id.is_empty() {
            continue;
        }
        if seen.contains(&task.node_id) {
            tracing::warn!(node = %task.node_id, "Several tasks share one host node");
            continue;
        }
        seen.push(task.node_id.clone());
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubInventory {
        labelled: usize,
        tasks: Vec<TaskInstance>,
        label_queries: AtomicUsize,
    }

    impl Inventory for StubInventory {
        async fn find_service(&self, _name: &str, _label: &str) -> Result<ServiceSpec> {
            Err(Error::Inventory("not used".into()))
        }

        async fn count_labelled_nodes(&self, _label: &str) -> Result<usize> {
            self.label_queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.labelled)
        }

        async fn list_tasks(&self, _service_name: &str) -> Result<Vec<TaskInstance>> {
            Ok(self.tasks.clone())
        }

        async fn get_node(&self, node_id: &str) -> Result<SwarmNode> {
            Err(Error::NodeLookup(node_id.to_string()))
        }
    }

    fn task(id: &str, node: &str, state: TaskState) -> TaskInstance {
        TaskInstance {
            id: id.to_string(),
            node_id: node.to_string(),
            state,
        }
    }

    fn spec(mode: ScalingMode) -> ServiceSpec {
        ServiceSpec {
            id: "svc".into(),
            name: "garage".into(),
            mode,
        }
    }

    #[tokio::test]
    async fn test_fixed_count_skips_label_query() {
        let inventory = StubInventory {
            labelled: 9,
            ..Default::default()
        };

        for n in [0, 1, 3, 7] {
            let expected =
                resolve_expected_size(&inventory, &spec(ScalingMode::FixedCount { replicas: n }))
                    .await
                    .unwrap();
            assert_eq!(expected, n);
        }
        assert_eq!(inventory.label_queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_constrained_set_counts_labelled_nodes() {
        let inventory = StubInventory {
            labelled: 4,
            ..Default::default()
        };
        let mode = ScalingMode::ConstrainedSet {
            placement_label: "garage".into(),
        };

        assert_eq!(resolve_expected_size(&inventory, &spec(mode)).await.unwrap(), 4);
        assert_eq!(inventory.label_queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_running_filter() {
        let inventory = StubInventory {
            tasks: vec![
                task("t1", "n1", TaskState::Running),
                task("t2", "n2", TaskState::Pending),
                task("t3", "n3", TaskState::Failed),
                task("t4", "n4", TaskState::Running),
            ],
            ..Default::default()
        };

        let running = list_running_tasks(&inventory, "garage").await.unwrap();
        let ids: Vec<_> = running.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t4"]);
    }

    #[test]
    fn test_host_nodes_dedup_in_order() {
        let tasks = vec![
            task("t1", "n2", TaskState::Running),
            task("t2", "n1", TaskState::Running),
            task("t3", "n2", TaskState::Running),
            task("t4", "", TaskState::Running),
        ];
        assert_eq!(host_nodes(&tasks), vec!["n2", "n1"]);
    }
}
