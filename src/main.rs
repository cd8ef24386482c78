use anyhow::{bail, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info};

use inventory_admin::api::{ApiError, HttpInventoryClient, InMemoryBackend, InventoryApi};
use inventory_admin::cli::commands::{
    demo, orders, products, report_api_error, report_error, show_how_to_get_started,
    suppliers, CommandContext,
};
use inventory_admin::cli::{Cli, Commands};
use inventory_admin::config::InventoryAdminConfig;
use inventory_admin::shutdown::ShutdownCoordinator;
use inventory_admin::telemetry::init_telemetry;
use inventory_admin::workflows::WorkflowError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    InventoryAdminConfig::load_env_file()?;
    let mut config = InventoryAdminConfig::load_from(&cli.config)?;
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    init_telemetry(&config.observability)?;
    debug!(base_url = %config.api.base_url, sample_backend = cli.sample_backend, "Configuration loaded");

    let metrics_enabled = config.observability.metrics_enabled;
    let outcome = dispatch(cli, config).await;
    ShutdownCoordinator::shutdown_all_services(metrics_enabled)?;

    if let Err(err) = outcome {
        report(&err);
        std::process::exit(1);
    }
    Ok(())
}

async fn dispatch(cli: Cli, config: InventoryAdminConfig) -> Result<()> {
    let Some(command) = cli.command else {
        return show_how_to_get_started().await;
    };

    if let Commands::InitConfig { force } = command {
        if cli.config.exists() && !force {
            bail!(
                "{} already exists (use --force to overwrite)",
                cli.config.display()
            );
        }
        config.save_to_file(&cli.config)?;
        println!("✅ Wrote {}", cli.config.display());
        return Ok(());
    }

    let api: Arc<dyn InventoryApi> = if cli.sample_backend || matches!(command, Commands::Demo) {
        info!("Using in-memory sample backend");
        Arc::new(InMemoryBackend::with_sample_data())
    } else {
        Arc::new(HttpInventoryClient::new(&config.api)?)
    };
    let ctx = CommandContext::new(api, config, cli.yes, cli.json);

    match command {
        Commands::Orders(command) => orders::run(&ctx, command).await,
        Commands::Suppliers(command) => suppliers::run(&ctx, command).await,
        Commands::Products(command) => products::run(&ctx, command).await,
        Commands::Demo => demo::run(&ctx).await,
        Commands::InitConfig { .. } => Ok(()),
    }
}

fn report(err: &anyhow::Error) {
    if let Some(workflow) = err.downcast_ref::<WorkflowError>() {
        report_error(workflow);
    } else if let Some(api) = err.downcast_ref::<ApiError>() {
        report_api_error(api);
    } else {
        eprintln!("❌ {err:#}");
    }
}
