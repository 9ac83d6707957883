//! Common utilities and types shared across garage-bootstrap

pub mod config;
pub mod error;
pub mod utils;

pub use config::BootstrapConfig;
pub use error::{Error, LayoutStep, Result};
pub use utils::{host_port, label, parse_capacity, parse_tags, read_token};
