//! Garage admin API
//!
//! Every call targets one node, addressed by its host address; the port,
//! scheme and bearer token are fixed per run.

pub mod client;
pub mod types;

pub use client::AdminClient;
pub use types::{
    ApplyLayoutRequest, ConnectResult, HealthResponse, LayoutEntry, LayoutResponse, StatusResponse,
};

use crate::common::Result;

/// Per-node admin operations used by the bootstrap
#[allow(async_fn_in_trait)]
pub trait AdminApi {
    /// Node's self-reported cluster id
    async fn status(&self, address: &str) -> Result<StatusResponse>;

    /// Ask the node to dial every peer link (`id@host:port`)
    async fn connect(&self, address: &str, peers: &[String]) -> Result<Vec<ConnectResult>>;

    async fn health(&self, address: &str) -> Result<HealthResponse>;

    async fn layout(&self, address: &str) -> Result<LayoutResponse>;

    async fn stage_layout(&self, address: &str, entries: &[LayoutEntry]) -> Result<()>;

    async fn apply_layout(&self, address: &str, version: u64) -> Result<()>;
}
