//! Docker Engine API client (swarm endpoints)
//!
//! By default this talks to the local Engine socket, which a swarm task gets
//! by bind-mounting `/var/run/docker.sock` on a manager node. A `tcp://` or
//! `http://` endpoint (e.g. a read-only socket proxy) is accepted instead.

use crate::common::{Error, Result};
use crate::inventory::types::{ScalingMode, ServiceSpec, SwarmNode, TaskInstance, TaskState};
use crate::inventory::Inventory;
use bollard::errors::Error as EngineError;
use bollard::models::ServiceSpecMode;
use bollard::node::ListNodesOptions;
use bollard::service::ListServicesOptions;
use bollard::task::ListTasksOptions;
use bollard::{Docker, API_DEFAULT_VERSION};
use std::collections::HashMap;
use std::time::Duration;

/// Engine endpoint used when nothing else is configured
pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// Where the Engine API is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEndpoint {
    /// Unix socket path
    Socket(String),
    /// `host:port` reached over plain HTTP
    Tcp(String),
}

impl EngineEndpoint {
    /// Parse `unix:///path`, a bare absolute path, `tcp://host:port` or
    /// `http://host:port`.
    pub fn parse(docker_host: &str) -> Result<Self> {
        let host = docker_host.trim();
        if let Some(path) = host.strip_prefix("unix://") {
            return Self::socket(path, docker_host);
        }
        if host.starts_with('/') {
            return Self::socket(host, docker_host);
        }

        let addr = host
            .strip_prefix("tcp://")
            .or_else(|| host.strip_prefix("http://"))
            .ok_or_else(|| {
                Error::InvalidConfig(format!("unsupported docker_host: {}", docker_host))
            })?
            .trim_end_matches('/');
        if addr.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "docker_host has no address: {}",
                docker_host
            )));
        }
        Ok(EngineEndpoint::Tcp(addr.to_string()))
    }

    fn socket(path: &str, docker_host: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "docker_host has no socket path: {}",
                docker_host
            )));
        }
        Ok(EngineEndpoint::Socket(path.to_string()))
    }
}

/// Inventory backed by the Docker Engine API
pub struct DockerInventory {
    docker: Docker,
}

impl DockerInventory {
    /// Client for `docker_host` (see [`EngineEndpoint::parse`]). No connection
    /// is made until the first query.
    pub fn new(docker_host: &str, timeout: Duration) -> Result<Self> {
        let timeout_secs = timeout.as_secs().max(1);
        let docker = match EngineEndpoint::parse(docker_host)? {
            EngineEndpoint::Socket(path) => {
                Docker::connect_with_unix(&path, timeout_secs, API_DEFAULT_VERSION)
            }
            EngineEndpoint::Tcp(addr) => {
                Docker::connect_with_http(&addr, timeout_secs, API_DEFAULT_VERSION)
            }
        }
        .map_err(|e| Error::Inventory(format!("cannot reach Engine at {}: {}", docker_host, e)))?;

        Ok(Self { docker })
    }
}

fn engine_error(what: &str, e: EngineError) -> Error {
    Error::Inventory(format!("{} failed: {}", what, e))
}

fn filters(key: &str, value: String) -> HashMap<String, Vec<String>> {
    HashMap::from([(key.to_string(), vec![value])])
}

impl Inventory for DockerInventory {
    async fn find_service(&self, name: &str, placement_label: &str) -> Result<ServiceSpec> {
        let services = self
            .docker
            .list_services(Some(ListServicesOptions {
                filters: filters("name", name.to_string()),
                ..Default::default()
            }))
            .await
            .map_err(|e| engine_error("list services", e))?;

        // The name filter matches prefixes; prefer the exact name.
        let index = services
            .iter()
            .position(|s| {
                s.spec
                    .as_ref()
                    .and_then(|spec| spec.name.as_deref())
                    .is_some_and(|n| n == name)
            })
            .unwrap_or(0);
        let service = services
            .into_iter()
            .nth(index)
            .ok_or_else(|| Error::Inventory(format!("service {} not found", name)))?;

        let spec = service.spec.unwrap_or_default();
        let mode = service_mode(spec.mode.as_ref(), placement_label)?;
        Ok(ServiceSpec {
            id: service.id.unwrap_or_default(),
            name: spec.name.unwrap_or_else(|| name.to_string()),
            mode,
        })
    }

    async fn count_labelled_nodes(&self, label: &str) -> Result<usize> {
        let nodes = self
            .docker
            .list_nodes(Some(ListNodesOptions {
                filters: filters("node.label", format!("{}=true", label)),
                ..Default::default()
            }))
            .await
            .map_err(|e| engine_error("list nodes", e))?;
        Ok(nodes.len())
    }

    async fn list_tasks(&self, service_name: &str) -> Result<Vec<TaskInstance>> {
        let tasks = self
            .docker
            .list_tasks(Some(ListTasksOptions {
                filters: filters("service", service_name.to_string()),
                ..Default::default()
            }))
            .await
            .map_err(|e| engine_error("list tasks", e))?;

        Ok(tasks
            .into_iter()
            .map(|t| {
                let state = t
                    .status
                    .and_then(|status| status.state)
                    .map(|state| state.to_string())
                    .unwrap_or_default();
                TaskInstance {
                    id: t.id.unwrap_or_default(),
                    node_id: t.node_id.unwrap_or_default(),
                    state: TaskState::from_engine(&state),
                }
            })
            .collect())
    }

    async fn get_node(&self, node_id: &str) -> Result<SwarmNode> {
        let node = match self.docker.inspect_node(node_id).await {
            Ok(node) => node,
            Err(EngineError::DockerResponseServerError {
                status_code: 404, ..
            }) => return Err(Error::NodeLookup(format!("node {} no longer exists", node_id))),
            Err(e) => return Err(engine_error(&format!("inspect node {}", node_id), e)),
        };

        let address = node
            .status
            .and_then(|status| status.addr)
            .filter(|addr| !addr.is_empty())
            .ok_or_else(|| Error::NodeLookup(format!("node {} has no address", node_id)))?;

        Ok(SwarmNode {
            id: node.id.unwrap_or_else(|| node_id.to_string()),
            address,
            labels: node.spec.and_then(|spec| spec.labels).unwrap_or_default(),
        })
    }
}

fn service_mode(mode: Option<&ServiceSpecMode>, placement_label: &str) -> Result<ScalingMode> {
    let mode = mode.ok_or_else(|| Error::Inventory("service has no scaling mode".into()))?;

    if let Some(replicated) = &mode.replicated {
        let replicas = replicated.replicas.unwrap_or(1);
        let replicas = usize::try_from(replicas)
            .map_err(|_| Error::Inventory(format!("invalid replica count {}", replicas)))?;
        return Ok(ScalingMode::FixedCount { replicas });
    }
    if mode.global.is_some() {
        return Ok(ScalingMode::ConstrainedSet {
            placement_label: placement_label.to_string(),
        });
    }
    if mode.replicated_job.is_some() || mode.global_job.is_some() {
        return Err(Error::Inventory("job-mode services are not supported".into()));
    }
    Err(Error::Inventory("service has no scaling mode".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_mode(json: &str) -> Result<ScalingMode> {
        let mode: ServiceSpecMode = serde_json::from_str(json).unwrap();
        service_mode(Some(&mode), "garage")
    }

    #[test]
    fn test_service_modes() {
        assert_eq!(
            parse_mode(r#"{"Replicated":{"Replicas":3}}"#).unwrap(),
            ScalingMode::FixedCount { replicas: 3 }
        );
        assert_eq!(
            parse_mode(r#"{"Replicated":{}}"#).unwrap(),
            ScalingMode::FixedCount { replicas: 1 }
        );
        assert_eq!(
            parse_mode(r#"{"Global":{}}"#).unwrap(),
            ScalingMode::ConstrainedSet {
                placement_label: "garage".into()
            }
        );
        assert!(parse_mode(r#"{"GlobalJob":{}}"#).is_err());
        assert!(parse_mode(r#"{}"#).is_err());
        assert!(parse_mode(r#"{"Replicated":{"Replicas":-1}}"#).is_err());
        assert!(service_mode(None, "garage").is_err());
    }

    #[test]
    fn test_endpoint_parsing() {
        assert_eq!(
            EngineEndpoint::parse(DEFAULT_DOCKER_HOST).unwrap(),
            EngineEndpoint::Socket("/var/run/docker.sock".into())
        );
        assert_eq!(
            EngineEndpoint::parse("/run/user/1000/docker.sock").unwrap(),
            EngineEndpoint::Socket("/run/user/1000/docker.sock".into())
        );
        assert_eq!(
            EngineEndpoint::parse("tcp://manager-1:2375").unwrap(),
            EngineEndpoint::Tcp("manager-1:2375".into())
        );
        assert_eq!(
            EngineEndpoint::parse("http://socket-proxy:2375/").unwrap(),
            EngineEndpoint::Tcp("socket-proxy:2375".into())
        );
        assert!(EngineEndpoint::parse("unix://").is_err());
        assert!(EngineEndpoint::parse("tcp://").is_err());
        assert!(EngineEndpoint::parse("ssh://manager-1").is_err());
    }
}
