//! traefik-fed
//!
//! Federates the routers of several Traefik instances into one dynamic
//! configuration.
//!
//! # Architecture Overview
//!
//! ```text
//!     ┌──────────┐   ┌──────────┐
//!     │ traefik  │   │ traefik  │   ...   upstream admin APIs
//!     └────┬─────┘   └────┬─────┘
//!          │  GET /api/http/routers
//!          ▼              ▼
//!     ┌────────────────────────────┐
//!     │ aggregator                 │  filter + rename + defaults
//!     └─────────────┬──────────────┘
//!                   │ snapshot (every poll interval)
//!          ┌────────┴────────┐
//!          ▼                 ▼
//!     ┌──────────┐     ┌──────────┐
//!     │ http     │     │ file     │
//!     │ /config  │     │ sink     │
//!     └──────────┘     └──────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use traefik_fed::config::{load_config, LogConfig};
use traefik_fed::lifecycle::{self, BuildInfo};
use traefik_fed::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "traefik-fed")]
#[command(about = "Federate routers from multiple Traefik instances", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Path to the configuration file (YAML or TOML)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,

    /// Print version information and exit
    #[arg(short = 'V', long)]
    version: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let build_info = BuildInfo::current();

    if cli.version {
        println!("{build_info}");
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&LogConfig::default());
            tracing::error!(path = %cli.config.display(), error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.log);

    tracing::info!(
        path = %cli.config.display(),
        upstreams = config.upstreams.len(),
        poll_interval = ?config.server.poll_interval,
        http_enabled = config.output.http.enabled,
        file_enabled = config.output.file.enabled,
        "Configuration loaded"
    );

    if cli.check {
        tracing::info!("Configuration is valid");
        return ExitCode::SUCCESS;
    }

    tracing::info!(version = %build_info.version, "traefik-fed starting");

    match lifecycle::run(config, build_info).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
