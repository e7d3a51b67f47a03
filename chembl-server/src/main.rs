//! `chembl-mcp`: serve the ChEMBL catalog to an agent over stdio or HTTP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chembl_config::{LogLevel, ServerConfig, TransportKind, loader};
use clap::Parser;
use tracing::{info, warn};

/// Command-line flags. Each one overrides the file and environment layers.
#[derive(Debug, Parser)]
#[command(name = "chembl-mcp", version, about = "ChEMBL tool server")]
struct Cli {
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind address for the HTTP transport.
    #[arg(long)]
    host: Option<String>,

    /// Bind port for the HTTP transport.
    #[arg(long)]
    port: Option<u16>,

    /// Transport to serve on: stdio or http.
    #[arg(long)]
    transport: Option<TransportKind>,

    /// Log level: debug, info, warning, error or critical.
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Base URL of the ChEMBL REST API.
    #[arg(long)]
    base_url: Option<String>,

    /// Maximum number of requests executing at once.
    #[arg(long)]
    max_in_flight: Option<usize>,
}

impl Cli {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(base_url) = self.base_url {
            config.upstream.base_url = base_url;
        }
        if let Some(limit) = self.max_in_flight {
            config.max_in_flight = limit;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = loader::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut config);

    chembl_telemetry::init(config.log_level.directive()).context("initialising logging")?;
    config.validate().context("validating configuration")?;

    info!(
        transport = %config.transport,
        bind = %config.bind_address(),
        max_in_flight = config.max_in_flight,
        "starting chembl-mcp"
    );

    let service = chembl_server::build_default_service(&config).context("building service")?;
    chembl_server::serve(&config, service, shutdown_signal())
        .await
        .context("serving")?;

    info!("chembl-mcp stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
