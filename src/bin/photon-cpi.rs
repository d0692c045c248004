// SPDX-License-Identifier: MIT OR Apache-2.0

//! `photon-cpi`: reads one CPI request from stdin and writes one response
//! envelope to stdout. Logs go to stderr.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use photon_cpi_rs::cpi::{default_registry, handle_request};
use photon_cpi_rs::{ActionResponse, CpiConfig, CpiContext, ErrorKind};
use tokio::io::AsyncReadExt;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "photon-cpi")]
#[command(about = "BOSH cloud provider interface for the Photon controller")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// CPI configuration file (default: ~/.photon/cpi.json)
    #[arg(long = "config-path", env = "PHOTON_CPI_CONFIG")]
    config_path: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read request from stdin")?;

    let response = run(cli.config_path, &input).await;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, &response).context("Failed to write response")?;
    writeln!(stdout)?;
    Ok(())
}

async fn run(config_path: Option<PathBuf>, input: &str) -> ActionResponse {
    let ctx = match load_config(config_path).and_then(CpiContext::new) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = %e, "Failed to set up CPI");
            return ActionResponse::failure(ErrorKind::CloudError, e.to_string());
        }
    };

    handle_request(Arc::new(ctx), &default_registry(), input).await
}

#[allow(clippy::result_large_err)]
fn load_config(path: Option<PathBuf>) -> photon_cpi_rs::error::Result<CpiConfig> {
    let Some(path) = path else {
        return CpiConfig::load_with_env();
    };
    let mut config = CpiConfig::load_from_path(path)?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
}
