//! Bootstrap binary

use clap::Parser;
use garage_bootstrap::admin::AdminClient;
use garage_bootstrap::common::read_token;
use garage_bootstrap::inventory::DockerInventory;
use garage_bootstrap::{BootstrapConfig, BootstrapSettings, Bootstrapper};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "garage-bootstrap")]
#[command(about = "Bootstrap a Garage cluster running as a Docker Swarm service")]
#[command(version)]
struct Cli {
    /// Optional TOML config file; GARAGE_* environment variables override it
    #[arg(long, env = "GARAGE_BOOTSTRAP_CONFIG")]
    config: Option<PathBuf>,
}

async fn run(cli: Cli) -> garage_bootstrap::Result<()> {
    let config = BootstrapConfig::load(cli.config.as_deref())?;
    let token = read_token(&config.admin_token_file)?;

    let inventory = DockerInventory::new(&config.docker_host, config.request_timeout())?;
    let admin = AdminClient::new(&config, token)?;
    let bootstrapper = Bootstrapper::new(inventory, admin, BootstrapSettings::from_config(&config));

    let report = bootstrapper.run().await?;
    tracing::info!(
        service = %report.service,
        expected_tasks = report.expected_tasks,
        nodes = report.peers.len(),
        layout_version = report.layout_version,
        task_polls = report.task_polls,
        gossip_polls = report.gossip_polls,
        "Cluster bootstrapped"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Bootstrap failed");
            if e.leaves_staged_layout() {
                tracing::error!("Staged layout changes remain on the cluster");
            }
            ExitCode::from(e.exit_code())
        }
    }
}
