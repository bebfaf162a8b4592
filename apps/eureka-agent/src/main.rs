mod config;
mod instance;
mod lease;
mod logging;
mod signals;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eureka_client::RegistryClient;

use crate::config::{AgentConfig, CliOverrides};

/// Eureka agent - announces the local service and keeps its lease alive
#[derive(Parser)]
#[command(name = "eureka-agent")]
#[command(about = "Registers the local service with a Eureka registry and renews its lease")]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Registry base URI (overrides `EUREKA_URL` and the config file)
    #[arg(long)]
    registry_url: Option<String>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register, heartbeat and keep the lease alive until shutdown
    Run,
    /// Validate configuration, print the instance payload and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = cli.config.as_deref()
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (APP_*, EUREKA_URL, EUREKA__*) -> 4) CLI
    let mut config = AgentConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(&CliOverrides {
        registry_url: cli.registry_url.clone(),
        verbose: cli.verbose,
    });

    logging::init(&config.logging);

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_agent(&config).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AgentConfig) -> Result<()> {
    config
        .registry
        .validate()
        .context("registry address is not usable")?;

    let instance = instance::build_instance(&config.app);
    println!("Configuration is valid");
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({ "instance": instance.export() }))?
    );
    Ok(())
}

async fn run_agent(config: &AgentConfig) -> Result<()> {
    let instance = instance::build_instance(&config.app);
    let client = Arc::new(
        RegistryClient::new(&config.registry, &instance)
            .context("failed to build registry client")?,
    );

    tracing::info!(
        app = client.app(),
        instance_id = client.instance_id(),
        registry = %client.base_url(),
        "eureka agent starting"
    );

    lease::announce(&client, config.lease.on_register_failure).await?;

    if !config.lease.keep_alive {
        return Ok(());
    }

    let heartbeats =
        lease::Heartbeats::spawn(Arc::clone(&client), config.lease.heartbeat_interval());

    let signal = signals::wait_for_shutdown().await;
    let stopped = lease::shutdown(&client, heartbeats, config.lease.deregister_on_shutdown).await;
    signal?;
    stopped
}
