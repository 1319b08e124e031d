//! `robotshop`: runs one or all of the shop's services, or drives a running shop with
//! generated load.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use robotshop::config::ShopConfig;
use robotshop::http;
use robotshop::lifecycle::{Service, ShopSystem};
use robotshop::loadgen::{self, LoadSettings};
use shop_kernel::tracing::setup_tracing;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "robotshop", version, about = "Robot shop order fulfillment services")]
struct Cli {
    /// TOML configuration file, layered over the built-in defaults.
    #[arg(long, global = true, env = "ROBOTSHOP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the customer registry.
    Customers,
    /// Run the robot factory.
    Factory,
    /// Run the order service against remote customer and factory services.
    Orders,
    /// Run all three services in this process.
    All,
    /// Generate load against a running shop.
    Load(LoadArgs),
}

#[derive(Debug, Args)]
struct LoadArgs {
    #[arg(long, default_value_t = 5)]
    customers: usize,
    #[arg(long, default_value_t = 20)]
    orders: usize,
    #[arg(long)]
    order_service: Option<String>,
    #[arg(long)]
    customer_service: Option<String>,
    #[arg(long)]
    factory_service: Option<String>,
    /// Seconds an order may take before it counts as timed out.
    #[arg(long, default_value_t = 120)]
    deadline_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ShopConfig::load(cli.config.as_deref()).context("loading configuration")?;
    setup_tracing(config.logging.format, &config.logging.level);

    match cli.command {
        Command::Customers => serve(vec![ShopSystem::customer_service()], &config).await,
        Command::Factory => serve(vec![ShopSystem::factory_service(&config.factory)], &config).await,
        Command::Orders => {
            let orders = ShopSystem::order_service(&config.orders)?;
            serve(vec![orders], &config).await
        }
        Command::All => {
            let systems = vec![
                ShopSystem::customer_service(),
                ShopSystem::factory_service(&config.factory),
                ShopSystem::order_service(&config.orders)?,
            ];
            serve(systems, &config).await
        }
        Command::Load(args) => load(args, &config).await,
    }
}

fn bind_address(config: &ShopConfig, service: Service) -> &str {
    match service {
        Service::Customers => &config.customers.bind,
        Service::Factory => &config.factory.bind,
        Service::Orders => &config.orders.bind,
    }
}

/// Serves every router of `systems` until Ctrl-C, then shuts the systems down.
async fn serve(systems: Vec<ShopSystem>, config: &ShopConfig) -> Result<()> {
    let (stop, stopped) = watch::channel(false);
    let mut servers = JoinSet::new();
    for system in &systems {
        for (service, router) in system.routers() {
            let addr = bind_address(config, service);
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding the {service} service to {addr}"))?;
            info!(%service, %addr, "Service started");
            let mut stopped = stopped.clone();
            servers.spawn(http::serve(listener, router, async move {
                let _ = stopped.changed().await;
            }));
        }
    }

    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal.context("waiting for Ctrl-C")?,
        Some(ended) = servers.join_next() => {
            warn!("A server stopped on its own");
            ended??;
        }
    }

    info!("Stopping servers");
    let _ = stop.send(true);
    while let Some(ended) = servers.join_next().await {
        ended??;
    }
    for system in systems {
        system.shutdown().await?;
    }
    Ok(())
}

async fn load(args: LoadArgs, config: &ShopConfig) -> Result<()> {
    let settings = LoadSettings {
        customers: args.customers,
        orders: args.orders,
        customer_service: args
            .customer_service
            .unwrap_or_else(|| config.orders.customer_service_url.clone()),
        factory_service: args
            .factory_service
            .unwrap_or_else(|| config.orders.factory_service_url.clone()),
        order_service: args
            .order_service
            .unwrap_or_else(|| format!("http://{}", config.orders.bind)),
        deadline: Duration::from_secs(args.deadline_secs),
        request_timeout: config.orders.request_timeout(),
        ..LoadSettings::default()
    };
    let report = loadgen::run(&settings).await?;
    println!(
        "{} orders: {} succeeded, {} failed, {} timed out, {} rejected",
        report.total(),
        report.succeeded,
        report.failed,
        report.timed_out,
        report.rejected
    );
    Ok(())
}
