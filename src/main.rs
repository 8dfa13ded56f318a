//! CLI entry point for coxiris-link
//!
//! Serves the COXIRIS command protocol over a serial port or over
//! stdin/stdout, with the simulated stage bound to every operation.
//!
//! # Usage
//!
//! ```bash
//! coxiris-link --config config/coxiris.toml serial --port /dev/ttyACM0
//! printf 'GET_ID\r\n' | coxiris-link stdio
//! coxiris-link help-text
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coxiris_link::{
    bind_stage, build_processor, logging, serve, write_help_listing, LinkConfig, SimulatedStage,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "coxiris-link")]
#[command(about = "Command link for the COXIRIS positioning system", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the protocol on a serial port
    Serial {
        /// Serial device, overrides transport.port
        #[arg(long)]
        port: Option<String>,

        /// Baud rate, overrides transport.baud_rate
        #[arg(long)]
        baud: Option<u32>,
    },

    /// Serve the protocol on stdin/stdout
    Stdio,

    /// Print the command listing sent in reply to HELP
    HelpText,

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = LinkConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Commands::Serial { port, baud } = &cli.command {
        if let Some(port) = port {
            config.transport.port = Some(port.clone());
        }
        if let Some(baud) = baud {
            config.transport.baud_rate = *baud;
        }
    }
    config
        .validate()
        .map_err(coxiris_link::LinkError::Configuration)?;

    match cli.command {
        Commands::HelpText => {
            write_help_listing(std::io::stdout().lock())?;
            Ok(())
        }
        Commands::Config => {
            print!("{}", config.to_toml().context("rendering configuration")?);
            Ok(())
        }
        Commands::Stdio => {
            logging::init_from_config(&config.logging)?;
            run_stdio(&config).await
        }
        Commands::Serial { .. } => {
            logging::init_from_config(&config.logging)?;
            run_serial(&config).await
        }
    }
}

async fn run_stdio(config: &LinkConfig) -> Result<()> {
    let stage = Arc::new(SimulatedStage::from_config(&config.simulator));
    let mut processor = build_processor(config, bind_stage(stage));

    info!("serving on stdio");
    tokio::select! {
        stats = serve(tokio::io::stdin(), tokio::io::stdout(), &mut processor) => {
            stats?;
        }
        _ = tokio::signal::ctrl_c() => warn!("interrupted"),
    }
    Ok(())
}

#[cfg(feature = "serial")]
async fn run_serial(config: &LinkConfig) -> Result<()> {
    use coxiris_link::serial::{drain_serial_buffer, open_serial_async, DynSerial};

    let transport = &config.transport;
    let path = transport
        .port
        .as_deref()
        .context("no serial port given (use --port or transport.port)")?;

    let mut port: DynSerial = Box::new(
        open_serial_async(path, transport.baud_rate)
            .await
            .map_err(|e| coxiris_link::LinkError::Serial(format!("{e:#}")))?,
    );
    info!(port = path, baud = transport.baud_rate, "serial port open");

    if transport.drain_on_open {
        let discarded = drain_serial_buffer(&mut port, transport.drain_timeout_ms).await;
        if discarded > 0 {
            info!(discarded, "drained stale input");
        }
    }

    let stage = Arc::new(SimulatedStage::from_config(&config.simulator));
    let mut processor = build_processor(config, bind_stage(stage));
    let (reader, writer) = tokio::io::split(port);

    tokio::select! {
        stats = serve(reader, writer, &mut processor) => {
            stats?;
        }
        _ = tokio::signal::ctrl_c() => warn!("interrupted"),
    }
    Ok(())
}

#[cfg(not(feature = "serial"))]
async fn run_serial(_config: &LinkConfig) -> Result<()> {
    anyhow::bail!("serial support not enabled. Rebuild with --features serial")
}
