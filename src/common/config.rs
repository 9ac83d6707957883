//! Configuration for garage-bootstrap
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `GARAGE_*` environment variables (highest priority).

use crate::common::{Error, Result};
use crate::inventory::{EngineEndpoint, DEFAULT_DOCKER_HOST};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix for every recognized option
pub const ENV_PREFIX: &str = "GARAGE";

/// Bootstrap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Swarm service running the Garage nodes
    pub service_name: String,

    /// Node label that constrains a global service (`<label>=true`)
    #[serde(default = "default_placement_label")]
    pub placement_label: String,

    /// Node label holding the layout zone
    #[serde(default = "default_zone_label")]
    pub zone_label: String,

    /// Node label holding the layout capacity
    #[serde(default = "default_capacity_label")]
    pub capacity_label: String,

    /// Node label holding comma-separated layout tags
    #[serde(default = "default_tags_label")]
    pub tags_label: String,

    /// Garage admin API port
    #[serde(default = "default_admin_port")]
    pub admin_port: u16,

    /// Garage RPC port, used in peer links
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// File holding the admin bearer token
    pub admin_token_file: PathBuf,

    /// `http` or `https`
    #[serde(default = "default_admin_scheme")]
    pub admin_scheme: String,

    /// Path prefix in front of every admin endpoint (e.g. `/v1`)
    #[serde(default)]
    pub admin_path_prefix: String,

    /// Accept self-signed admin certificates
    #[serde(default)]
    pub admin_insecure_tls: bool,

    /// Docker Engine API endpoint: `unix://` socket, `tcp://` or `http://`
    #[serde(default = "default_docker_host")]
    pub docker_host: String,

    /// Delay between readiness polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Readiness poll ceiling
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-request HTTP timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for one node's identity probe
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Nodes probed at once during peer resolution (1 = sequential)
    #[serde(default = "default_resolve_concurrency")]
    pub resolve_concurrency: usize,
}

fn default_placement_label() -> String {
    "garage".to_string()
}
fn default_zone_label() -> String {
    "garage.zone".to_string()
}
fn default_capacity_label() -> String {
    "garage.capacity".to_string()
}
fn default_tags_label() -> String {
    "garage.tags".to_string()
}
fn default_admin_port() -> u16 {
    3903
}
fn default_rpc_port() -> u16 {
    3901
}
fn default_admin_scheme() -> String {
    "https".to_string()
}
fn default_docker_host() -> String {
    DEFAULT_DOCKER_HOST.to_string()
}
fn default_poll_interval() -> u64 {
    2000
}
fn default_max_attempts() -> u32 {
    150
}
fn default_request_timeout() -> u64 {
    30
}
fn default_probe_timeout() -> u64 {
    10
}
fn default_resolve_concurrency() -> usize {
    1
}

impl BootstrapConfig {
    /// Load from an optional TOML file overlaid with `GARAGE_*` env vars.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(::config::File::from(path.to_path_buf()).required(true));
        }
        builder = builder.add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: BootstrapConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the bootstrap cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.service_name.trim().is_empty() {
            return Err(Error::InvalidConfig("service_name cannot be empty".into()));
        }

        for (name, value) in [
            ("placement_label", &self.placement_label),
            ("zone_label", &self.zone_label),
            ("capacity_label", &self.capacity_label),
            ("tags_label", &self.tags_label),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{} cannot be empty", name)));
            }
        }

        if self.admin_port == 0 || self.rpc_port == 0 {
            return Err(Error::InvalidConfig("ports must be non-zero".into()));
        }
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfig("max_attempts must be at least 1".into()));
        }
        if self.resolve_concurrency == 0 {
            return Err(Error::InvalidConfig(
                "resolve_concurrency must be at least 1".into(),
            ));
        }
        if !matches!(self.admin_scheme.as_str(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "unsupported admin_scheme: {}",
                self.admin_scheme
            )));
        }
        EngineEndpoint::parse(&self.docker_host)?;

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_file_with_defaults() {
        let file = write_config(
            "service_name = 'garage_garage'\nadmin_token_file = '/run/secrets/garage_admin'\n",
        );

        let config = BootstrapConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.service_name, "garage_garage");
        assert_eq!(config.admin_port, 3903);
        assert_eq!(config.rpc_port, 3901);
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.max_attempts, 150);
        assert_eq!(config.resolve_concurrency, 1);
        assert_eq!(config.admin_scheme, "https");
        assert!(config.admin_path_prefix.is_empty());
        assert_eq!(config.docker_host, "unix:///var/run/docker.sock");
    }

    #[test]
    fn test_file_overrides() {
        let file = write_config(
            "service_name = 's3'\nadmin_token_file = '/tok'\nadmin_port = 4903\n\
             zone_label = 'dc'\nmax_attempts = 3\nresolve_concurrency = 4\n",
        );

        let config = BootstrapConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.admin_port, 4903);
        assert_eq!(config.zone_label, "dc");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.resolve_concurrency, 4);
    }

    #[test]
    fn test_missing_required_field() {
        let file = write_config("service_name = 's3'\n");
        assert!(BootstrapConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let file = write_config("service_name = 's3'\nadmin_token_file = '/tok'\n");
        let base = BootstrapConfig::load(Some(file.path())).unwrap();

        let mut bad = base.clone();
        bad.service_name = "  ".into();
        assert!(matches!(bad.validate(), Err(Error::InvalidConfig(_))));

        let mut bad = base.clone();
        bad.max_attempts = 0;
        assert!(bad.validate().is_err());

        let mut bad = base.clone();
        bad.admin_scheme = "ftp".into();
        assert!(bad.validate().is_err());

        let mut bad = base.clone();
        bad.tags_label = String::new();
        assert!(bad.validate().is_err());

        let mut bad = base.clone();
        bad.rpc_port = 0;
        assert!(bad.validate().is_err());

        let mut bad = base.clone();
        bad.docker_host = "ssh://manager-1".into();
        assert!(matches!(bad.validate(), Err(Error::InvalidConfig(_))));

        let mut proxy = base;
        proxy.docker_host = "tcp://socket-proxy:2375".into();
        assert!(proxy.validate().is_ok());
    }
}
