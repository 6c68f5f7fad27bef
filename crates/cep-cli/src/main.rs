//! CEP - Capability enumeration command-line tool
//!
//! Emulates a device from a TOML profile, enumerates its capabilities and
//! prints the capability document. Optionally registers it with a gateway.

mod config;
mod host;
mod register;

use anyhow::{Context, Result};
use cep_core::{
    CapabilityDocument, DescriptorRegistry, NetworkFactsProvider, NetworkInterface,
    StaticNetwork, StaticPlatform,
};
use cep_discovery::{BusSpec, Enumerator, SimulatedBus};
use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "cep")]
#[command(about = "Describe a microcontroller's identity, resources and peripherals")]
#[command(version)]
struct Args {
    /// Path to device profile
    #[arg(short, long, default_value = "cep.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Pretty-print the document
    #[arg(long)]
    pretty: bool,

    /// Report this host's network interfaces instead of the profile's
    #[arg(long)]
    host_network: bool,

    /// Gateway base URL to register the document with
    #[arg(long, value_name = "URL")]
    register: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the document
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("CEP v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config(&args.config)?;
    let base_dir = args
        .config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let registry = config.registry(base_dir)?;

    let interfaces = if args.host_network {
        host::HostNetwork.interfaces()
    } else {
        config.network_interfaces()
    };
    let fallback_id = interfaces.iter().find_map(|iface| iface.mac.clone());

    let mut identity = config.identity(fallback_id.as_deref())?;
    identity.reported_at = Some(Utc::now());
    let platform = config.to_platform(identity);
    let buses = config.buses()?;

    let document = enumerate(registry, platform, interfaces, buses).await?;

    let json = if args.pretty {
        document.to_json_pretty()
    } else {
        document.to_json()
    }
    .context("Failed to serialize capability document")?;
    println!("{}", json);

    if let Some(url) = args.register {
        register::register(&url, &document).await?;
    }

    Ok(())
}

/// Run the enumeration on the blocking pool; scanning sleeps between probes
async fn enumerate(
    registry: DescriptorRegistry,
    platform: StaticPlatform,
    interfaces: Vec<NetworkInterface>,
    buses: Vec<(BusSpec, SimulatedBus)>,
) -> Result<CapabilityDocument> {
    tokio::task::spawn_blocking(move || {
        let mut enumerator = Enumerator::new(&registry).with_platform(platform);
        if !interfaces.is_empty() {
            enumerator = enumerator.with_network(StaticNetwork(interfaces));
        }
        for (spec, bus) in buses {
            enumerator = enumerator.attach_bus(spec, bus);
        }
        enumerator.run().document
    })
    .await
    .context("Enumeration task failed")
}
