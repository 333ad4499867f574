//! CLI entry point for the tally-discover daemon.

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use tally_inventory::{InventoryClient, InventoryConfig};

use tally_discover::config::DiscoverConfig;
use tally_discover::report::AssetReporter;
use tally_discover::scanner::NmapScanner;
use tally_discover::scheduler::DiscoveryService;

#[derive(Parser)]
#[command(name = "tally-discover")]
#[command(about = "Network discovery daemon for the Tally asset inventory")]
struct Cli {
    /// Run a single discovery cycle and exit.
    #[arg(long)]
    once: bool,

    /// Run as daemon with scheduled cycles.
    #[arg(long)]
    daemon: bool,

    /// Ping-sweep a subnet, print responsive addresses, and exit.
    #[arg(long, value_name = "CIDR")]
    sweep: Option<String>,

    /// Override the configured subnets with a single CIDR.
    #[arg(short, long)]
    subnet: Option<String>,

    /// Config file prefix (default: tally).
    #[arg(short, long, default_value = "tally")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();

    let mut discover_config = load_discover_config(&cli.config)?;
    if let Some(subnet) = cli.subnet.clone() {
        discover_config.subnets = vec![subnet];
    }
    discover_config.validate()?;

    let scanner = NmapScanner::new(&discover_config.nmap_path, discover_config.scan_timeout_secs);
    let version = scanner.verify_installation().await?;
    tracing::info!(nmap_version = %version.trim(), "Nmap verified");

    if let Some(target) = cli.sweep.as_deref() {
        let hosts = scanner.ping_sweep(target).await?;
        for host in &hosts {
            println!("{host}");
        }
        return Ok(());
    }

    let inventory_config = load_inventory_config(&cli.config)?;
    let client = InventoryClient::new(&inventory_config)?;
    let reporter = AssetReporter::new(client);
    let mut service = DiscoveryService::new(discover_config, scanner, reporter);

    if cli.once {
        let discovered = service.run_cycle().await?;
        tracing::info!(assets = discovered, "One-shot discovery cycle finished");
    } else if cli.daemon {
        let (stop_tx, stop_rx) = watch::channel(false);

        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            tracing::info!("Shutdown signal received");
            let _ = stop_tx.send(true);
        });

        service.run(stop_rx).await;
    } else {
        anyhow::bail!(
            "Specify --once (single cycle), --daemon (scheduled discovery), or --sweep <cidr>"
        );
    }

    Ok(())
}

fn load_discover_config(file_prefix: &str) -> anyhow::Result<DiscoverConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("TALLY_DISCOVER")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<DiscoverConfig>("discover") {
        Ok(c) => Ok(c),
        Err(_) => Ok(DiscoverConfig::default()),
    }
}

fn load_inventory_config(file_prefix: &str) -> anyhow::Result<InventoryConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("TALLY_INVENTORY")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<InventoryConfig>("inventory") {
        Ok(c) => Ok(c),
        Err(_) => Ok(InventoryConfig::default()),
    }
}
