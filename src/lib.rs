//! # garage-bootstrap
//!
//! One-shot bootstrap for a Garage cluster deployed as a Docker Swarm
//! service:
//! - discovers how many tasks the service should run
//! - waits until they all run
//! - resolves each host node into a cluster member (address, id, zone,
//!   capacity, tags)
//! - connects the members and waits for gossip to converge
//! - stages and applies the initial layout
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐        ┌──────────────────────────────┐
//! │  Swarm manager   │◄───────┤ Inventory (Engine API, read) │
//! │   (Engine API)   │        └──────────────┬───────────────┘
//! └──────────────────┘                       │ tasks, nodes, labels
//!                                 ┌──────────▼───────────┐
//!                                 │      Bootstrapper    │
//!                                 │ gate → resolve → mesh│
//!                                 │   → gate → layout    │
//!                                 └──────────┬───────────┘
//!                                            │ admin API (bearer token)
//!              ┌─────────────────┬───────────┴─────┬─────────────────┐
//!         ┌────▼─────┐      ┌────▼─────┐      ┌────▼─────┐
//!         │ garage 1 │      │ garage 2 │      │ garage 3 │
//!         └──────────┘      └──────────┘      └──────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! GARAGE_SERVICE_NAME=storage_garage \
//! GARAGE_ADMIN_TOKEN_FILE=/run/secrets/garage_admin_token \
//! garage-bootstrap
//! ```
//!
//! The Engine API is read through `/var/run/docker.sock` unless
//! `GARAGE_DOCKER_HOST` points at a `tcp://` or `http://` endpoint.

pub mod admin;
pub mod bootstrap;
pub mod common;
pub mod inventory;

// Re-export commonly used types
pub use bootstrap::{BootstrapReport, BootstrapSettings, Bootstrapper};
pub use common::{BootstrapConfig, Error, LayoutStep, Result};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
