//! Orchestration-side records: services, tasks and nodes

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How the service decides its replica count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalingMode {
    /// Replicated service with a declared replica count
    FixedCount { replicas: usize },
    /// Global service constrained to nodes labelled `<placement_label>=true`
    ConstrainedSet { placement_label: String },
}

/// Target service descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub id: String,
    pub name: String,
    pub mode: ScalingMode,
}

/// Task lifecycle state, folded from the Engine API's state names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Failed,
    Other(String),
}

impl TaskState {
    pub fn from_engine(state: &str) -> Self {
        match state {
            "running" => TaskState::Running,
            "new" | "allocated" | "pending" | "assigned" | "accepted" | "preparing" | "ready"
            | "starting" => TaskState::Pending,
            "failed" | "rejected" => TaskState::Failed,
            other => TaskState::Other(other.to_string()),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TaskState::Running)
    }
}

/// One scheduled unit of the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInstance {
    pub id: String,
    /// Host node; empty while the task is unassigned
    pub node_id: String,
    pub state: TaskState,
}

/// Host node details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwarmNode {
    pub id: String,
    pub address: String,
    pub labels: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_state_from_engine() {
        assert_eq!(TaskState::from_engine("running"), TaskState::Running);
        assert_eq!(TaskState::from_engine("starting"), TaskState::Pending);
        assert_eq!(TaskState::from_engine("rejected"), TaskState::Failed);
        assert_eq!(
            TaskState::from_engine("shutdown"),
            TaskState::Other("shutdown".into())
        );
        assert!(TaskState::Running.is_running());
        assert!(!TaskState::Pending.is_running());
        // Only an exact match counts as running
        assert!(!TaskState::from_engine("Running").is_running());
    }
}
